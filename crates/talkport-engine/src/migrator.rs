//! Entity migrators.
//!
//! [`Migrator`] bundles the injected collaborators. The per-entity upserts
//! live in `user.rs`, `story.rs` and `comment.rs` as further `impl` blocks.

use std::sync::Arc;

use dashmap::DashSet;
use serde::Serialize;
use tracing::{debug, warn};

use talkport_store::{SourceAsset, SourceComment, SourceStore, SourceUser, TargetStore};

use crate::{EntityKind, IdentityMapper, MigrateError, MigrationConfig};

/// What a single entity migration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The document was written.
    Written,
    /// The document already existed; nothing was written.
    Skipped,
    /// Dry run: the document was built but not written.
    Previewed,
}

/// Migrates users, stories and comments one at a time.
pub struct Migrator {
    pub(crate) source: Arc<dyn SourceStore>,
    pub(crate) target: Arc<dyn TargetStore>,
    pub(crate) mapper: Arc<dyn IdentityMapper>,
    pub(crate) config: MigrationConfig,
    /// Stories a dry run would have created, so comments on them preview.
    pub(crate) previewed_stories: DashSet<String>,
}

impl Migrator {
    /// Create a migrator. Fails fast on invalid configuration.
    pub fn new(
        config: MigrationConfig,
        source: Arc<dyn SourceStore>,
        target: Arc<dyn TargetStore>,
        mapper: Arc<dyn IdentityMapper>,
    ) -> Result<Self, MigrateError> {
        config.validate()?;
        Ok(Self {
            source,
            target,
            mapper,
            config,
            previewed_stories: DashSet::new(),
        })
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn SourceStore> {
        &self.source
    }

    pub fn target(&self) -> &Arc<dyn TargetStore> {
        &self.target
    }

    /// Log a document that is about to be written when debug dumps are on.
    pub(crate) fn dump<T: Serialize>(&self, kind: EntityKind, id: &str, document: &T) {
        if !self.config.debug {
            return;
        }
        match serde_json::to_string_pretty(document) {
            Ok(json) => debug!(%kind, id, dry_run = self.config.dry_run, "document:\n{}", json),
            Err(e) => warn!(%kind, id, error = %e, "failed to serialize document for debug dump"),
        }
    }
}

pub(crate) async fn require_user(
    source: &dyn SourceStore,
    id: &str,
) -> Result<SourceUser, MigrateError> {
    source
        .user(id)
        .await?
        .ok_or_else(|| MigrateError::source_not_found(EntityKind::User, id))
}

pub(crate) async fn require_asset(
    source: &dyn SourceStore,
    id: &str,
) -> Result<SourceAsset, MigrateError> {
    source
        .asset(id)
        .await?
        .ok_or_else(|| MigrateError::source_not_found(EntityKind::Story, id))
}

pub(crate) async fn require_comment(
    source: &dyn SourceStore,
    id: &str,
) -> Result<SourceComment, MigrateError> {
    source
        .comment(id)
        .await?
        .ok_or_else(|| MigrateError::source_not_found(EntityKind::Comment, id))
}
