//! Scheduler state and run report types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{EntityKind, MigrateError};

/// Where a source comment stands within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentState {
    /// Present in the target store.
    Migrated,
    /// Dry run: would have been written. Does not satisfy a reply's parent.
    Previewed,
    /// Waiting for its parent to be attempted.
    BlockedTransient,
    /// Can never be migrated in this run.
    BlockedPermanent(BlockReason),
}

impl CommentState {
    pub fn is_permanently_blocked(&self) -> bool {
        matches!(self, CommentState::BlockedPermanent(_))
    }
}

/// Why a comment ended up permanently unmigrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockReason {
    /// Migrating the comment, its author, or its story failed.
    Failed { step: EntityKind, error: String },
    /// The parent is permanently unmigrated.
    AncestorFailed { parent_id: String },
    /// The parent exists in the source but is not `ACCEPTED`.
    ParentNotAccepted { parent_id: String },
    /// The parent does not exist in the source.
    ParentMissing { parent_id: String },
    /// Dry run: the parent was only previewed, never written.
    ParentNotPersisted { parent_id: String },
    /// A whole sweep made no progress while this reply was waiting.
    Stalled { parent_id: String },
}

impl BlockReason {
    pub(crate) fn failed(step: EntityKind, error: &MigrateError) -> Self {
        BlockReason::Failed {
            step,
            error: error.to_string(),
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::Failed { step, error } => write!(f, "{} migration failed: {}", step, error),
            BlockReason::AncestorFailed { parent_id } => {
                write!(f, "parent {} was not migrated", parent_id)
            }
            BlockReason::ParentNotAccepted { parent_id } => {
                write!(f, "parent {} is not accepted", parent_id)
            }
            BlockReason::ParentMissing { parent_id } => {
                write!(f, "parent {} does not exist", parent_id)
            }
            BlockReason::ParentNotPersisted { parent_id } => {
                write!(f, "parent {} is not persisted in a dry run", parent_id)
            }
            BlockReason::Stalled { parent_id } => {
                write!(f, "parent {} never became available", parent_id)
            }
        }
    }
}

/// Counters for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Comments considered.
    pub seen: usize,
    /// Comments written in this run.
    pub migrated: usize,
    /// Comments found already present in the target store.
    pub already_migrated: usize,
    /// Comments a dry run would have written.
    pub previewed: usize,
    /// Comments permanently blocked.
    pub failed: usize,
}

/// Result of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub roots: PassStats,
    pub replies: PassStats,
    /// Number of reply sweeps performed.
    pub sweeps: usize,
    /// Every permanently unmigrated comment id and why.
    pub unmigrated: BTreeMap<String, BlockReason>,
}

impl MigrationReport {
    /// Ids of the comments that were not migrated, sorted.
    pub fn unmigrated_ids(&self) -> impl Iterator<Item = &str> {
        self.unmigrated.keys().map(String::as_str)
    }

    /// Whether every in-scope comment ended up migrated (or previewed).
    pub fn is_complete(&self) -> bool {
        self.unmigrated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_reason_serializes_with_tag() {
        let reason = BlockReason::AncestorFailed {
            parent_id: "r1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&reason).unwrap(),
            json!({"reason": "ancestor_failed", "parent_id": "r1"})
        );
    }

    #[test]
    fn test_failed_reason_carries_error_text() {
        let err = MigrateError::ConfigInvalid("x".to_string());
        let reason = BlockReason::failed(EntityKind::User, &err);
        assert_eq!(
            reason.to_string(),
            "user migration failed: invalid configuration: x"
        );
    }

    #[test]
    fn test_report_lists_unmigrated_ids_in_order() {
        let mut report = MigrationReport::default();
        assert!(report.is_complete());

        report.unmigrated.insert(
            "c2".to_string(),
            BlockReason::ParentMissing {
                parent_id: "x".to_string(),
            },
        );
        report.unmigrated.insert(
            "c1".to_string(),
            BlockReason::Stalled {
                parent_id: "y".to_string(),
            },
        );

        assert!(!report.is_complete());
        assert_eq!(report.unmigrated_ids().collect::<Vec<_>>(), vec!["c1", "c2"]);
    }
}
