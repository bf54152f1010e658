//! Error types for the migration engine.

use serde::Serialize;
use thiserror::Error;

use talkport_store::StoreError;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Story,
    Comment,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::User => "user",
            EntityKind::Story => "story",
            EntityKind::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Missing or invalid configuration. Fatal before any migration starts.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The source record does not exist.
    #[error("source {kind} not found: {id}")]
    SourceNotFound { kind: EntityKind, id: String },

    /// The identity mapper has no target id for this source record.
    #[error("{kind} {id} could not be mapped to a target identity")]
    UnmappableIdentity { kind: EntityKind, id: String },

    /// The parent of a reply has not been migrated yet.
    #[error("parent comment {parent_id} of {comment_id} is not migrated yet")]
    ParentNotReady {
        comment_id: String,
        parent_id: String,
    },

    /// The story a comment belongs to is missing from the target store.
    #[error("story {story_id} of comment {comment_id} has not been migrated")]
    StoryNotMigrated {
        comment_id: String,
        story_id: String,
    },

    /// A target document lacks a field the migration depends on.
    #[error("target {kind} {id} is malformed: {reason}")]
    MalformedTarget {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    /// Store request failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Whether retrying later, after other entities migrate, may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, MigrateError::ParentNotReady { .. })
    }

    pub(crate) fn source_not_found(kind: EntityKind, id: &str) -> Self {
        MigrateError::SourceNotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn unmappable(kind: EntityKind, id: &str) -> Self {
        MigrateError::UnmappableIdentity {
            kind,
            id: id.to_string(),
        }
    }
}
