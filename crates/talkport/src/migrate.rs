//! Migration subcommands.
//!
//! Each command loads the snapshot directories into memory, runs the
//! engine, and writes the target snapshot back unless it is a dry run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::Result;
use tracing::info;

use talkport_engine::{
    IdentityMapper, LogProgress, MigrationConfig, MigrationReport, Migrator, Outcome,
    PassStats, PassthroughMapper, TableMapper,
};
use talkport_store::{MemorySource, MemoryTarget, SourceStore};

/// Settings shared by every subcommand.
pub struct Options {
    pub source: PathBuf,
    pub target: PathBuf,
    pub identity_map: Option<PathBuf>,
    pub config: MigrationConfig,
}

/// Loaded stores for one command.
struct Session {
    source: Arc<MemorySource>,
    target: Arc<MemoryTarget>,
    mapper: Arc<dyn IdentityMapper>,
}

impl Session {
    fn open(options: &Options) -> Result<Self> {
        let source =
            Arc::new(MemorySource::load(&options.source).map_err(|e| miette::miette!("{}", e))?);
        let target =
            Arc::new(MemoryTarget::load(&options.target).map_err(|e| miette::miette!("{}", e))?);

        let mapper: Arc<dyn IdentityMapper> = match &options.identity_map {
            Some(path) => Arc::new(
                TableMapper::load(source.clone(), path).map_err(|e| miette::miette!("{}", e))?,
            ),
            None => Arc::new(PassthroughMapper::new(source.clone())),
        };

        Ok(Self {
            source,
            target,
            mapper,
        })
    }

    fn migrator(&self, config: MigrationConfig) -> Result<Migrator> {
        Migrator::new(
            config,
            self.source.clone(),
            self.target.clone(),
            self.mapper.clone(),
        )
        .map_err(|e| miette::miette!("{}", e))
    }

    /// Persist the target store unless nothing may be written.
    fn close(&self, options: &Options) -> Result<()> {
        if options.config.dry_run {
            info!("dry run, target snapshot left untouched");
            return Ok(());
        }
        self.target
            .save(&options.target)
            .map_err(|e| miette::miette!("{}", e))
    }
}

/// Full two-pass migration.
pub async fn run_all(options: &Options, report_path: Option<&Path>) -> Result<()> {
    let session = Session::open(options)?;
    let migrator = session.migrator(options.config.clone())?;

    let report = talkport_engine::run(migrator, Box::new(LogProgress::default()))
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    session.close(options)?;
    print_report(&report);

    if let Some(path) = report_path {
        write_report(&report, path)?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

pub async fn run_user(options: &Options, id: &str, update: bool) -> Result<()> {
    let session = Session::open(options)?;
    let config = options.config.clone().with_update_users(update);
    let outcome = session
        .migrator(config)?
        .migrate_user(id, update)
        .await
        .map_err(|e| miette::miette!("{}", e))?;
    session.close(options)?;
    print_outcome("user", id, outcome);
    Ok(())
}

pub async fn run_story(options: &Options, asset_id: &str) -> Result<()> {
    let session = Session::open(options)?;
    let outcome = session
        .migrator(options.config.clone())?
        .migrate_story(asset_id)
        .await
        .map_err(|e| miette::miette!("{}", e))?;
    session.close(options)?;
    print_outcome("story", asset_id, outcome);
    Ok(())
}

pub async fn run_comment(options: &Options, id: &str, parent: Option<&str>) -> Result<()> {
    let session = Session::open(options)?;

    let parent = match parent {
        Some(parent) => Some(parent.to_string()),
        None => session
            .source
            .comment(id)
            .await
            .map_err(|e| miette::miette!("{}", e))?
            .and_then(|c| c.parent_id),
    };

    let outcome = session
        .migrator(options.config.clone())?
        .migrate_comment(id, parent.as_deref())
        .await
        .map_err(|e| miette::miette!("{}", e))?;
    session.close(options)?;
    print_outcome("comment", id, outcome);
    Ok(())
}

fn print_outcome(kind: &str, id: &str, outcome: Outcome) {
    match outcome {
        Outcome::Written => println!("Migrated {} {}", kind, id),
        Outcome::Skipped => println!("Skipped {} {}: already migrated", kind, id),
        Outcome::Previewed => println!("Dry-run: {} {} would be migrated", kind, id),
    }
}

fn print_pass(name: &str, stats: &PassStats, dry_run: bool) {
    println!("\n=== {} ===", name);
    println!("  seen:             {}", stats.seen);
    if dry_run {
        println!("  would migrate:    {}", stats.previewed);
    } else {
        println!("  migrated:         {}", stats.migrated);
    }
    println!("  already migrated: {}", stats.already_migrated);
    println!("  not migrated:     {}", stats.failed);
}

fn print_report(report: &MigrationReport) {
    print_pass("Root comments", &report.roots, report.dry_run);
    print_pass("Replies", &report.replies, report.dry_run);
    println!("  sweeps:           {}", report.sweeps);

    if report.is_complete() {
        println!("\nAll comments migrated.");
        return;
    }

    println!("\nNot migrated ({}):", report.unmigrated.len());
    for (id, reason) in &report.unmigrated {
        println!("  - {}: {}", id, reason);
    }
}

fn write_report(report: &MigrationReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| miette::miette!("{}", e))?;
    std::fs::write(path, json)
        .map_err(|e| miette::miette!("failed to write report to {}: {}", path.display(), e))
}
