//! Comment tree scheduler.
//!
//! Orders comment migration so that a comment is only written once its
//! author, its story and (for replies) its parent are in the target store.
//! Roots go first in a single pass; replies are then swept repeatedly until
//! every one of them is either migrated or permanently blocked.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use talkport_store::SourceComment;

use crate::{
    BlockReason, CommentState, EntityKind, MigrateError, MigrationReport, Migrator, Outcome,
    PassStats,
};

/// Default number of comments between progress log lines.
const DEFAULT_PROGRESS_INTERVAL: usize = 500;

/// Which pass of a run is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Roots,
    Replies,
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pass::Roots => f.write_str("roots"),
            Pass::Replies => f.write_str("replies"),
        }
    }
}

/// Receives progress updates while the scheduler runs.
pub trait Progress: Send + Sync {
    fn pass_started(&self, _pass: Pass, _total: usize) {}

    fn advanced(&self, _pass: Pass, _done: usize, _total: usize) {}

    fn sweep_finished(&self, _sweep: usize, _remaining: usize) {}

    fn pass_finished(&self, _pass: Pass, _stats: &PassStats) {}
}

/// Reports progress as `tracing` events.
pub struct LogProgress {
    every: usize,
}

impl LogProgress {
    /// Log a line every `every` comments.
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

impl Progress for LogProgress {
    fn pass_started(&self, pass: Pass, total: usize) {
        info!(%pass, total, "pass started");
    }

    fn advanced(&self, pass: Pass, done: usize, total: usize) {
        if done % self.every == 0 || done == total {
            info!(%pass, done, total, "progress");
        }
    }

    fn sweep_finished(&self, sweep: usize, remaining: usize) {
        debug!(sweep, remaining, "reply sweep finished");
    }

    fn pass_finished(&self, pass: Pass, stats: &PassStats) {
        info!(
            %pass,
            migrated = stats.migrated,
            already_migrated = stats.already_migrated,
            previewed = stats.previewed,
            failed = stats.failed,
            "pass finished"
        );
    }
}

/// Drops progress updates.
pub struct NoProgress;

impl Progress for NoProgress {}

/// What one sweep decided for a reply.
enum Resolution {
    Done(Outcome),
    Blocked(BlockReason),
    Deferred,
}

/// Drives the two migration passes and keeps the per-run bookkeeping.
pub struct CommentTreeScheduler {
    migrator: Migrator,
    progress: Box<dyn Progress>,
    states: HashMap<String, CommentState>,
    /// Users already attempted this run; `Some` holds the failure.
    users: HashMap<String, Option<BlockReason>>,
    /// Stories already attempted this run, keyed by asset id.
    stories: HashMap<String, Option<BlockReason>>,
    report: MigrationReport,
}

impl CommentTreeScheduler {
    pub fn new(migrator: Migrator) -> Self {
        let report = MigrationReport {
            dry_run: migrator.config.dry_run,
            ..MigrationReport::default()
        };
        Self {
            migrator,
            progress: Box::new(NoProgress),
            states: HashMap::new(),
            users: HashMap::new(),
            stories: HashMap::new(),
            report,
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// State of a comment as far as this run knows.
    pub fn state(&self, comment_id: &str) -> Option<&CommentState> {
        self.states.get(comment_id)
    }

    pub fn report(&self) -> &MigrationReport {
        &self.report
    }

    pub fn into_report(self) -> MigrationReport {
        self.report
    }

    /// Pass 1: migrate every accepted root comment.
    #[tracing::instrument(skip(self))]
    pub async fn run_roots(&mut self) -> Result<(), MigrateError> {
        let roots = self.migrator.source.accepted_roots().await?;
        let total = roots.len();
        self.progress.pass_started(Pass::Roots, total);

        let mut stats = PassStats::default();
        for (done, root) in roots.iter().enumerate() {
            stats.seen += 1;
            match self.resolve_root(root).await {
                Ok(outcome) => self.settle(&root.id, outcome, &mut stats),
                Err(reason) => self.block(&root.id, reason, &mut stats),
            }
            self.progress.advanced(Pass::Roots, done + 1, total);
        }

        self.progress.pass_finished(Pass::Roots, &stats);
        self.report.roots = stats;
        Ok(())
    }

    /// Pass 2: sweep the accepted replies until none remain.
    #[tracing::instrument(skip(self))]
    pub async fn run_replies(&mut self) -> Result<(), MigrateError> {
        let mut remaining = self.migrator.source.accepted_replies().await?;
        let total = remaining.len();
        self.progress.pass_started(Pass::Replies, total);

        let mut stats = PassStats {
            seen: total,
            ..PassStats::default()
        };
        let mut sweeps = 0;

        while !remaining.is_empty() {
            sweeps += 1;
            let before = remaining.len();
            debug!(sweep = sweeps, remaining = before, "starting reply sweep");

            let mut deferred = Vec::new();
            for reply in std::mem::take(&mut remaining) {
                match self.resolve_reply(&reply).await {
                    Resolution::Done(outcome) => self.settle(&reply.id, outcome, &mut stats),
                    Resolution::Blocked(reason) => self.block(&reply.id, reason, &mut stats),
                    Resolution::Deferred => {
                        self.states
                            .insert(reply.id.clone(), CommentState::BlockedTransient);
                        deferred.push(reply);
                    }
                }
            }
            remaining = deferred;

            self.progress.sweep_finished(sweeps, remaining.len());
            self.progress
                .advanced(Pass::Replies, total - remaining.len(), total);

            if remaining.len() == before {
                self.abandon(&mut remaining, sweeps, &mut stats);
            }
        }

        self.progress.pass_finished(Pass::Replies, &stats);
        self.report.replies = stats;
        self.report.sweeps = sweeps;
        Ok(())
    }

    /// Permanently block replies left over after a sweep without progress.
    fn abandon(&mut self, remaining: &mut Vec<SourceComment>, sweep: usize, stats: &mut PassStats) {
        let dry_run = self.migrator.config.dry_run;
        error!(
            sweep,
            remaining = remaining.len(),
            dry_run,
            "reply sweep made no progress, abandoning remaining replies"
        );
        for reply in remaining.drain(..) {
            let parent_id = reply.parent_id.clone().unwrap_or_default();
            let reason = if dry_run {
                BlockReason::ParentNotPersisted { parent_id }
            } else {
                BlockReason::Stalled { parent_id }
            };
            self.block(&reply.id, reason, stats);
        }
    }

    async fn resolve_root(&mut self, root: &SourceComment) -> Result<Outcome, BlockReason> {
        match self.is_migrated(&root.id).await {
            Ok(true) => {
                debug!(comment_id = %root.id, "comment already migrated");
                return Ok(Outcome::Skipped);
            }
            Ok(false) => {}
            Err(e) => return Err(BlockReason::failed(EntityKind::Comment, &e)),
        }

        self.ensure_user(&root.author_id).await?;
        self.ensure_story(&root.asset_id).await?;

        self.migrator
            .migrate_comment(&root.id, None)
            .await
            .map_err(|e| BlockReason::failed(EntityKind::Comment, &e))
    }

    async fn resolve_reply(&mut self, reply: &SourceComment) -> Resolution {
        let Some(parent_id) = reply.parent_id.as_deref() else {
            return match self.resolve_root(reply).await {
                Ok(outcome) => Resolution::Done(outcome),
                Err(reason) => Resolution::Blocked(reason),
            };
        };

        match self.is_migrated(&reply.id).await {
            Ok(true) => return Resolution::Done(Outcome::Skipped),
            Ok(false) => {}
            Err(e) => return Resolution::Blocked(BlockReason::failed(EntityKind::Comment, &e)),
        }

        if self
            .states
            .get(parent_id)
            .is_some_and(CommentState::is_permanently_blocked)
        {
            return Resolution::Blocked(BlockReason::AncestorFailed {
                parent_id: parent_id.to_string(),
            });
        }

        match self.is_migrated(parent_id).await {
            Err(e) => Resolution::Blocked(BlockReason::failed(EntityKind::Comment, &e)),
            Ok(true) => {
                if let Err(reason) = self.ensure_user(&reply.author_id).await {
                    return Resolution::Blocked(reason);
                }
                match self.migrator.migrate_comment(&reply.id, Some(parent_id)).await {
                    Ok(outcome) => Resolution::Done(outcome),
                    Err(e) if e.is_transient() => Resolution::Deferred,
                    Err(e) => Resolution::Blocked(BlockReason::failed(EntityKind::Comment, &e)),
                }
            }
            Ok(false) => match self.migrator.source.comment(parent_id).await {
                Err(e) => Resolution::Blocked(BlockReason::failed(
                    EntityKind::Comment,
                    &MigrateError::from(e),
                )),
                Ok(None) => Resolution::Blocked(BlockReason::ParentMissing {
                    parent_id: parent_id.to_string(),
                }),
                Ok(Some(parent)) if !parent.is_accepted() => {
                    Resolution::Blocked(BlockReason::ParentNotAccepted {
                        parent_id: parent_id.to_string(),
                    })
                }
                Ok(Some(_)) => Resolution::Deferred,
            },
        }
    }

    /// Whether a comment is in the target store, asking the store only for
    /// ids this run has not settled yet.
    async fn is_migrated(&mut self, comment_id: &str) -> Result<bool, MigrateError> {
        match self.states.get(comment_id) {
            Some(CommentState::Migrated) => return Ok(true),
            Some(CommentState::BlockedPermanent(_)) => return Ok(false),
            _ => {}
        }
        let present = self.migrator.target.has_comment(comment_id).await?;
        if present {
            self.states
                .insert(comment_id.to_string(), CommentState::Migrated);
        }
        Ok(present)
    }

    async fn ensure_user(&mut self, user_id: &str) -> Result<(), BlockReason> {
        if let Some(memo) = self.users.get(user_id) {
            return memo.clone().map_or(Ok(()), Err);
        }
        let update = self.migrator.config.update_users;
        let result = self
            .migrator
            .migrate_user(user_id, update)
            .await
            .map(|_| ())
            .map_err(|e| BlockReason::failed(EntityKind::User, &e));
        self.users
            .insert(user_id.to_string(), result.clone().err());
        result
    }

    async fn ensure_story(&mut self, asset_id: &str) -> Result<(), BlockReason> {
        if let Some(memo) = self.stories.get(asset_id) {
            return memo.clone().map_or(Ok(()), Err);
        }
        let result = self
            .migrator
            .migrate_story(asset_id)
            .await
            .map(|_| ())
            .map_err(|e| BlockReason::failed(EntityKind::Story, &e));
        self.stories
            .insert(asset_id.to_string(), result.clone().err());
        result
    }

    fn settle(&mut self, comment_id: &str, outcome: Outcome, stats: &mut PassStats) {
        let state = match outcome {
            Outcome::Written => {
                stats.migrated += 1;
                CommentState::Migrated
            }
            Outcome::Skipped => {
                stats.already_migrated += 1;
                CommentState::Migrated
            }
            Outcome::Previewed => {
                stats.previewed += 1;
                CommentState::Previewed
            }
        };
        self.states.insert(comment_id.to_string(), state);
    }

    fn block(&mut self, comment_id: &str, reason: BlockReason, stats: &mut PassStats) {
        warn!(comment_id, %reason, "comment not migrated");
        stats.failed += 1;
        self.report
            .unmigrated
            .insert(comment_id.to_string(), reason.clone());
        self.states
            .insert(comment_id.to_string(), CommentState::BlockedPermanent(reason));
    }
}
