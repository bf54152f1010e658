//! Comment migration.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use talkport_store::{
    Revision, RevisionMetadata, SourceComment, StoreError, StoryCounter, TargetComment,
    TargetCommentStatus,
};

use crate::migrator::require_comment;
use crate::{EntityKind, MigrateError, MigrationConfig, Migrator, Outcome};

impl Migrator {
    /// Migrate one comment, as a reply of `parent_id` when given.
    ///
    /// Precondition: the comment's author and story have been migrated.
    /// The comment is inserted before the parent link or story counter is
    /// touched, so a refused insert never leaves a side effect behind. If
    /// that second write fails the comment is removed again.
    #[tracing::instrument(skip(self), fields(dry_run = self.config.dry_run))]
    pub async fn migrate_comment(
        &self,
        comment_id: &str,
        parent_id: Option<&str>,
    ) -> Result<Outcome, MigrateError> {
        if self.target.has_comment(comment_id).await? {
            debug!("comment already migrated");
            return Ok(Outcome::Skipped);
        }

        if let Some(parent_id) = parent_id
            && !self.target.has_comment(parent_id).await?
        {
            return Err(MigrateError::ParentNotReady {
                comment_id: comment_id.to_string(),
                parent_id: parent_id.to_string(),
            });
        }

        let source = require_comment(self.source.as_ref(), comment_id).await?;

        let author_id = self
            .mapper
            .map_user(&source.author_id)
            .await?
            .target_id
            .ok_or_else(|| MigrateError::unmappable(EntityKind::User, &source.author_id))?;

        let story_id = self
            .mapper
            .map_story(&source.asset_id)
            .await?
            .target_id
            .ok_or_else(|| MigrateError::unmappable(EntityKind::Story, &source.asset_id))?;

        if !self.story_ready(&story_id).await? {
            return Err(MigrateError::StoryNotMigrated {
                comment_id: comment_id.to_string(),
                story_id,
            });
        }

        let mut document = build_comment(&self.config, &source, author_id, story_id);

        if let Some(parent_id) = parent_id {
            let parent = self.target.comment(parent_id).await?.ok_or_else(|| {
                MigrateError::ParentNotReady {
                    comment_id: comment_id.to_string(),
                    parent_id: parent_id.to_string(),
                }
            })?;
            let revision_id = parent
                .first_revision_id()
                .ok_or_else(|| MigrateError::MalformedTarget {
                    kind: EntityKind::Comment,
                    id: parent_id.to_string(),
                    reason: "comment has no revisions".to_string(),
                })?;

            document.parent_id = Some(parent_id.to_string());
            document.parent_revision_id = Some(revision_id.to_string());
            // Only the immediate parent, even for deeper threads.
            document.ancestor_ids = vec![parent_id.to_string()];
        }

        self.dump(EntityKind::Comment, comment_id, &document);

        if self.config.dry_run {
            return Ok(Outcome::Previewed);
        }

        match self.target.insert_comment(&document).await {
            Ok(()) => {}
            Err(StoreError::Duplicate { .. }) => {
                debug!("comment created concurrently");
                return Ok(Outcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        }

        let linked = match parent_id {
            Some(parent_id) => self.target.append_child(parent_id, comment_id).await.map(|_| ()),
            None => {
                self.target
                    .increment_story_counter(&document.story_id, StoryCounter::Approved)
                    .await
            }
        };
        if let Err(e) = linked {
            // An unlinked comment would be skipped by every later run.
            if let Err(undo) = self.target.remove_comment(comment_id).await {
                warn!(error = %undo, "failed to remove unlinked comment");
            }
            return Err(e.into());
        }

        info!(
            story_id = %document.story_id,
            parent_id = ?document.parent_id,
            "migrated comment"
        );
        Ok(Outcome::Written)
    }
}

fn build_comment(
    config: &MigrationConfig,
    source: &SourceComment,
    author_id: String,
    story_id: String,
) -> TargetComment {
    let revision = Revision {
        id: Uuid::new_v4().to_string(),
        body: format!("<div>{}</div>", source.body),
        action_counts: BTreeMap::new(),
        metadata: RevisionMetadata {
            nudge: true,
            link_count: 0,
        },
        created_at: source.created_at,
    };

    TargetComment {
        id: source.id.clone(),
        tenant_id: config.tenant_id.clone(),
        site_id: config.site_id.clone(),
        story_id,
        author_id,
        revisions: vec![revision],
        parent_id: None,
        parent_revision_id: None,
        ancestor_ids: Vec::new(),
        child_ids: Vec::new(),
        child_count: 0,
        tags: Vec::new(),
        status: TargetCommentStatus::None,
        action_counts: BTreeMap::new(),
        created_at: source.created_at,
    }
}
