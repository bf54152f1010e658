//! Full-run driver.

use tracing::{info, warn};

use crate::{CommentTreeScheduler, MigrateError, MigrationReport, Migrator, Progress};

/// Run both passes and report what could not be migrated.
///
/// Only configuration errors and failing source queries abort the run;
/// per-entity failures end up in the report.
pub async fn run(
    migrator: Migrator,
    progress: Box<dyn Progress>,
) -> Result<MigrationReport, MigrateError> {
    migrator.config().validate()?;
    info!(
        tenant_id = %migrator.config().tenant_id,
        site_id = %migrator.config().site_id,
        dry_run = migrator.config().dry_run,
        "starting migration"
    );

    let mut scheduler = CommentTreeScheduler::new(migrator).with_progress(progress);
    scheduler.run_roots().await?;
    scheduler.run_replies().await?;
    let report = scheduler.into_report();

    if report.is_complete() {
        info!("all comments migrated");
    } else {
        let ids: Vec<&str> = report.unmigrated_ids().collect();
        warn!(count = ids.len(), ids = ?ids, "some comments were not migrated");
    }
    Ok(report)
}
