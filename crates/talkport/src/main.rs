//! talkport: comment platform v4 to v6 migration
//!
//! Main binary with subcommands:
//! - `run`: migrate every accepted comment along with its authors and stories
//! - `user`: migrate a single user
//! - `story`: migrate the story behind a single asset
//! - `comment`: migrate a single comment

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use talkport_engine::MigrationConfig;

/// Parse boolean from environment variable, accepting common truthy values.
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true.
/// Accepts "0", "false", "no", "off", "" (case-insensitive) as false.
fn parse_bool_env(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(format!(
            "invalid boolean value '{}', expected 1/true/yes/on or 0/false/no/off",
            s
        )),
    }
}

mod migrate;

/// Log filter used when `RUST_LOG` is unset.
fn default_filter(debug: bool) -> &'static str {
    if debug {
        "talkport=debug,talkport_engine=debug,talkport_store=debug"
    } else {
        "talkport=info,talkport_engine=info,talkport_store=info"
    }
}

#[derive(Parser)]
#[command(name = "talkport")]
#[command(about = "Migrate comments from a v4 store to a v6 store", long_about = None)]
struct Cli {
    /// v4 snapshot directory (users.json, assets.json, comments.json)
    #[arg(long, env = "TALKPORT_SOURCE")]
    source: PathBuf,

    /// v6 snapshot directory, created if missing
    #[arg(long, env = "TALKPORT_TARGET")]
    target: PathBuf,

    /// Tenant the migrated documents belong to
    #[arg(long, env = "TALKPORT_TENANT_ID")]
    tenant_id: String,

    /// Site the migrated stories and comments belong to
    #[arg(long, env = "TALKPORT_SITE_ID")]
    site_id: String,

    /// JSON identity tables; source ids are kept when absent
    #[arg(long, env = "TALKPORT_IDENTITY_MAP")]
    identity_map: Option<PathBuf>,

    /// Log at debug level and dump every document built.
    /// Accepts "1", "true", "yes", or "on".
    #[arg(long, env = "TALKPORT_DEBUG", value_parser = parse_bool_env, default_value = "false")]
    debug: bool,

    /// Build documents without writing anything
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate all accepted comments, roots first, then replies
    Run {
        /// Write the run report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Migrate one user
    User {
        /// Source user id (email address)
        #[arg(value_name = "ID")]
        id: String,

        /// Rewrite the user if it already exists
        #[arg(long)]
        update: bool,
    },

    /// Migrate the story for one asset
    Story {
        /// Source asset id
        #[arg(value_name = "ASSET_ID")]
        asset_id: String,
    },

    /// Migrate one comment. Its author, story and parent must already be migrated.
    Comment {
        /// Source comment id
        #[arg(value_name = "ID")]
        id: String,

        /// Parent comment id; defaults to the source comment's parent
        #[arg(long)]
        parent: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(cli.debug).to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MigrationConfig::new(cli.tenant_id, cli.site_id)
        .map_err(|e| miette::miette!("{}", e))?
        .with_debug(cli.debug)
        .with_dry_run(cli.dry_run);

    let options = migrate::Options {
        source: cli.source,
        target: cli.target,
        identity_map: cli.identity_map,
        config,
    };

    match cli.command {
        Commands::Run { report } => migrate::run_all(&options, report.as_deref()).await,
        Commands::User { id, update } => migrate::run_user(&options, &id, update).await,
        Commands::Story { asset_id } => migrate::run_story(&options, &asset_id).await,
        Commands::Comment { id, parent } => {
            migrate::run_comment(&options, &id, parent.as_deref()).await
        }
    }
}
