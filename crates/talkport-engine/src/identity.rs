//! Identity mapping between source and target ids.
//!
//! A mapper answers "which target user/story does this source record become".
//! It must fail with [`MigrateError::SourceNotFound`] when the source record
//! itself is missing, and return a mapping with `target_id: None` when the
//! record exists but has no target identity yet.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use talkport_store::SourceStore;

use crate::MigrateError;
use crate::migrator::{require_asset, require_user};

/// Target identity of a source user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMapping {
    pub target_id: Option<String>,
    pub display_name: Option<String>,
}

/// Target identity of a source asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryMapping {
    pub target_id: Option<String>,
    pub url: String,
}

/// Resolves target identities for source users and assets.
#[async_trait]
pub trait IdentityMapper: Send + Sync {
    /// Map a source user id (an email address) to a target user.
    async fn map_user(&self, source_user_id: &str) -> Result<UserMapping, MigrateError>;

    /// Map a source asset id to a target story and its canonical URL.
    async fn map_story(&self, asset_id: &str) -> Result<StoryMapping, MigrateError>;
}

// =============================================================================
// Passthrough
// =============================================================================

/// Keeps source ids as target ids. The display name is the email and the
/// story URL is the asset URL.
pub struct PassthroughMapper {
    source: Arc<dyn SourceStore>,
}

impl PassthroughMapper {
    pub fn new(source: Arc<dyn SourceStore>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl IdentityMapper for PassthroughMapper {
    async fn map_user(&self, source_user_id: &str) -> Result<UserMapping, MigrateError> {
        let user = require_user(self.source.as_ref(), source_user_id).await?;
        Ok(UserMapping {
            target_id: Some(user.id.clone()),
            display_name: Some(user.id),
        })
    }

    async fn map_story(&self, asset_id: &str) -> Result<StoryMapping, MigrateError> {
        let asset = require_asset(self.source.as_ref(), asset_id).await?;
        Ok(StoryMapping {
            target_id: Some(asset.id),
            url: asset.url,
        })
    }
}

// =============================================================================
// Lookup tables
// =============================================================================

/// Target identity of one user in an identity table.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Target identity of one story in an identity table.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryEntry {
    pub id: String,
    /// Canonical URL; the asset URL is used when absent.
    #[serde(default)]
    pub url: Option<String>,
}

/// Identity tables as stored on disk.
///
/// ```json
/// {
///   "users": { "alice@example.com": { "id": "1042", "username": "Alice" } },
///   "stories": { "asset-1": { "id": "77", "url": "https://example.com/a/77" } }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityTables {
    #[serde(default)]
    pub users: HashMap<String, UserEntry>,
    #[serde(default)]
    pub stories: HashMap<String, StoryEntry>,
}

/// Maps through explicit lookup tables, usually exported from the system
/// that owns the target identities.
pub struct TableMapper {
    source: Arc<dyn SourceStore>,
    tables: IdentityTables,
}

impl TableMapper {
    pub fn new(source: Arc<dyn SourceStore>, tables: IdentityTables) -> Self {
        Self { source, tables }
    }

    /// Load tables from a JSON file.
    pub fn load(source: Arc<dyn SourceStore>, path: &Path) -> Result<Self, MigrateError> {
        let data = std::fs::read_to_string(path)?;
        let tables: IdentityTables = serde_json::from_str(&data)?;
        debug!(
            path = %path.display(),
            users = tables.users.len(),
            stories = tables.stories.len(),
            "loaded identity tables"
        );
        Ok(Self::new(source, tables))
    }
}

#[async_trait]
impl IdentityMapper for TableMapper {
    async fn map_user(&self, source_user_id: &str) -> Result<UserMapping, MigrateError> {
        require_user(self.source.as_ref(), source_user_id).await?;
        Ok(match self.tables.users.get(source_user_id) {
            Some(entry) => UserMapping {
                target_id: Some(entry.id.clone()),
                display_name: entry.username.clone(),
            },
            None => UserMapping::default(),
        })
    }

    async fn map_story(&self, asset_id: &str) -> Result<StoryMapping, MigrateError> {
        let asset = require_asset(self.source.as_ref(), asset_id).await?;
        Ok(match self.tables.stories.get(asset_id) {
            Some(entry) => StoryMapping {
                target_id: Some(entry.id.clone()),
                url: entry.url.clone().unwrap_or(asset.url),
            },
            None => StoryMapping {
                target_id: None,
                url: asset.url,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityKind;
    use talkport_store::{MemorySource, SourceAsset, SourceUser, SourceUserStatus, UserRole};

    fn source() -> Arc<MemorySource> {
        let source = MemorySource::new();
        source.insert_user(SourceUser {
            id: "alice@example.com".to_string(),
            role: UserRole::Commenter,
            created_at: "2020-01-01T00:00:00Z".parse().unwrap(),
            status: SourceUserStatus::default(),
        });
        source.insert_user(SourceUser {
            id: "bob@example.com".to_string(),
            role: UserRole::Commenter,
            created_at: "2020-01-01T00:00:00Z".parse().unwrap(),
            status: SourceUserStatus::default(),
        });
        source.insert_asset(SourceAsset {
            id: "a1".to_string(),
            url: "https://old.example.com/a1".to_string(),
            created_at: "2020-01-01T00:00:00Z".parse().unwrap(),
        });
        Arc::new(source)
    }

    fn tables() -> IdentityTables {
        serde_json::from_value(serde_json::json!({
            "users": { "alice@example.com": { "id": "1042", "username": "Alice" } },
            "stories": { "a1": { "id": "77" } }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_passthrough_keeps_ids() {
        let mapper = PassthroughMapper::new(source());

        let user = mapper.map_user("alice@example.com").await.unwrap();
        assert_eq!(user.target_id.as_deref(), Some("alice@example.com"));
        assert_eq!(user.display_name.as_deref(), Some("alice@example.com"));

        let story = mapper.map_story("a1").await.unwrap();
        assert_eq!(story.target_id.as_deref(), Some("a1"));
        assert_eq!(story.url, "https://old.example.com/a1");
    }

    #[tokio::test]
    async fn test_passthrough_missing_source_is_an_error() {
        let mapper = PassthroughMapper::new(source());

        let err = mapper.map_user("ghost@example.com").await.unwrap_err();
        assert!(matches!(
            err,
            MigrateError::SourceNotFound { kind: EntityKind::User, .. }
        ));

        let err = mapper.map_story("nope").await.unwrap_err();
        assert!(matches!(
            err,
            MigrateError::SourceNotFound { kind: EntityKind::Story, .. }
        ));
    }

    #[tokio::test]
    async fn test_table_mapper_hits_and_misses() {
        let mapper = TableMapper::new(source(), tables());

        let alice = mapper.map_user("alice@example.com").await.unwrap();
        assert_eq!(alice.target_id.as_deref(), Some("1042"));
        assert_eq!(alice.display_name.as_deref(), Some("Alice"));

        // Bob exists in the source but has no row: a None mapping, not an error.
        let bob = mapper.map_user("bob@example.com").await.unwrap();
        assert_eq!(bob, UserMapping::default());

        let err = mapper.map_user("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, MigrateError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_table_mapper_story_url_falls_back_to_asset() {
        let mapper = TableMapper::new(source(), tables());

        let story = mapper.map_story("a1").await.unwrap();
        assert_eq!(story.target_id.as_deref(), Some("77"));
        assert_eq!(story.url, "https://old.example.com/a1");
    }

    #[test]
    fn test_table_mapper_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        std::fs::write(&path, r#"{"users": {"a@b.c": {"id": "9"}}}"#).unwrap();

        let mapper = TableMapper::load(source(), &path).unwrap();
        assert_eq!(mapper.tables.users["a@b.c"].id, "9");
        assert!(mapper.tables.stories.is_empty());
    }
}
