//! Story migration.

use tracing::{debug, info};

use talkport_store::{CommentCounts, SourceAsset, StoreError, TargetStory};

use crate::migrator::require_asset;
use crate::{EntityKind, MigrateError, MigrationConfig, Migrator, Outcome};

impl Migrator {
    /// Migrate the story behind a source asset.
    ///
    /// Uses an insert rather than an upsert: an existing story carries live
    /// comment counters that must not be reset.
    #[tracing::instrument(skip(self), fields(dry_run = self.config.dry_run))]
    pub async fn migrate_story(&self, asset_id: &str) -> Result<Outcome, MigrateError> {
        let asset = require_asset(self.source.as_ref(), asset_id).await?;

        let mapping = self.mapper.map_story(asset_id).await?;
        let story_id = mapping
            .target_id
            .ok_or_else(|| MigrateError::unmappable(EntityKind::Story, asset_id))?;

        if self.target.story(&story_id).await?.is_some() {
            debug!(story_id = %story_id, "story already migrated");
            return Ok(Outcome::Skipped);
        }

        let document = build_story(&self.config, &asset, &story_id, mapping.url);
        self.dump(EntityKind::Story, asset_id, &document);

        if self.config.dry_run {
            self.previewed_stories.insert(story_id);
            return Ok(Outcome::Previewed);
        }

        match self.target.insert_story(&document).await {
            Ok(()) => {
                info!(story_id = %story_id, url = %document.url, "migrated story");
                Ok(Outcome::Written)
            }
            Err(StoreError::Duplicate { .. }) => {
                debug!(story_id = %story_id, "story created concurrently");
                Ok(Outcome::Skipped)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether comments may reference this story yet.
    pub(crate) async fn story_ready(&self, story_id: &str) -> Result<bool, MigrateError> {
        if self.target.story(story_id).await?.is_some() {
            return Ok(true);
        }
        Ok(self.config.dry_run && self.previewed_stories.contains(story_id))
    }
}

fn build_story(
    config: &MigrationConfig,
    asset: &SourceAsset,
    story_id: &str,
    url: String,
) -> TargetStory {
    TargetStory {
        id: story_id.to_string(),
        tenant_id: config.tenant_id.clone(),
        site_id: config.site_id.clone(),
        url,
        comment_counts: CommentCounts::default(),
        settings: serde_json::Map::new(),
        closed_at: None,
        created_at: asset.created_at,
    }
}
