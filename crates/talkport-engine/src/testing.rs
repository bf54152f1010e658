//! Shared fixtures for the engine's unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::{DashMap, DashSet};

use talkport_store::{
    MemorySource, MemoryTarget, SourceAsset, SourceComment, SourceCommentStatus, SourceUser,
    SourceUserStatus, UserRole,
};

use crate::{
    IdentityMapper, MigrateError, MigrationConfig, Migrator, PassthroughMapper, StoryMapping,
    UserMapping,
};

pub(crate) fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub(crate) fn user(id: &str, role: UserRole) -> SourceUser {
    SourceUser {
        id: id.to_string(),
        role,
        created_at: at(0),
        status: SourceUserStatus::default(),
    }
}

/// Passthrough mapping with ids that can be knocked out per test.
pub(crate) struct TestMapper {
    inner: PassthroughMapper,
    unmapped_users: DashSet<String>,
    unmapped_stories: DashSet<String>,
    user_lookups: DashMap<String, usize>,
}

impl TestMapper {
    pub(crate) fn user_lookups(&self, id: &str) -> usize {
        self.user_lookups.get(id).map(|n| *n).unwrap_or(0)
    }
}

#[async_trait]
impl IdentityMapper for TestMapper {
    async fn map_user(&self, source_user_id: &str) -> Result<UserMapping, MigrateError> {
        *self
            .user_lookups
            .entry(source_user_id.to_string())
            .or_insert(0) += 1;
        let mut mapping = self.inner.map_user(source_user_id).await?;
        if self.unmapped_users.contains(source_user_id) {
            mapping.target_id = None;
        }
        Ok(mapping)
    }

    async fn map_story(&self, asset_id: &str) -> Result<StoryMapping, MigrateError> {
        let mut mapping = self.inner.map_story(asset_id).await?;
        if self.unmapped_stories.contains(asset_id) {
            mapping.target_id = None;
        }
        Ok(mapping)
    }
}

pub(crate) struct Fixture {
    pub source: Arc<MemorySource>,
    pub target: Arc<MemoryTarget>,
    pub mapper: Arc<TestMapper>,
    clock: AtomicI64,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let source = Arc::new(MemorySource::new());
        let mapper = Arc::new(TestMapper {
            inner: PassthroughMapper::new(source.clone()),
            unmapped_users: DashSet::new(),
            unmapped_stories: DashSet::new(),
            user_lookups: DashMap::new(),
        });
        Self {
            source,
            target: Arc::new(MemoryTarget::new()),
            mapper,
            clock: AtomicI64::new(1),
        }
    }

    pub(crate) fn add_user(&self, id: &str, role: UserRole) {
        self.source.insert_user(user(id, role));
    }

    pub(crate) fn add_asset(&self, id: &str) {
        self.source.insert_asset(SourceAsset {
            id: id.to_string(),
            url: format!("https://example.com/{}", id),
            created_at: at(0),
        });
    }

    /// Add an accepted comment, created after every comment added so far.
    pub(crate) fn add_comment(&self, id: &str, author: &str, asset: &str, parent: Option<&str>) {
        let minute = self.clock.fetch_add(1, Ordering::SeqCst);
        self.add_comment_at(id, author, asset, parent, minute);
    }

    pub(crate) fn add_comment_at(
        &self,
        id: &str,
        author: &str,
        asset: &str,
        parent: Option<&str>,
        minute: i64,
    ) {
        self.source.insert_comment(SourceComment {
            id: id.to_string(),
            author_id: author.to_string(),
            asset_id: asset.to_string(),
            parent_id: parent.map(str::to_string),
            body: format!("body of {}", id),
            status: SourceCommentStatus::Accepted,
            created_at: at(minute),
        });
    }

    /// Add a comment by alice on `a1` with an explicit status.
    pub(crate) fn add_comment_with_status(
        &self,
        id: &str,
        parent: Option<&str>,
        status: SourceCommentStatus,
    ) {
        let minute = self.clock.fetch_add(1, Ordering::SeqCst);
        self.source.insert_comment(SourceComment {
            id: id.to_string(),
            author_id: "alice@example.com".to_string(),
            asset_id: "a1".to_string(),
            parent_id: parent.map(str::to_string),
            body: format!("body of {}", id),
            status,
            created_at: at(minute),
        });
    }

    pub(crate) fn unmap_user(&self, id: &str) {
        self.mapper.unmapped_users.insert(id.to_string());
    }

    pub(crate) fn unmap_story(&self, id: &str) {
        self.mapper.unmapped_stories.insert(id.to_string());
    }

    fn build(&self, config: MigrationConfig) -> Migrator {
        Migrator::new(
            config,
            self.source.clone(),
            self.target.clone(),
            self.mapper.clone(),
        )
        .unwrap()
    }

    pub(crate) fn migrator(&self) -> Migrator {
        self.build(MigrationConfig::new("tenant", "site").unwrap())
    }

    pub(crate) fn dry_run_migrator(&self) -> Migrator {
        self.build(
            MigrationConfig::new("tenant", "site")
                .unwrap()
                .with_dry_run(true),
        )
    }
}
