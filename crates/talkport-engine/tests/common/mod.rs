//! Helpers shared by the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use talkport_engine::{
    MigrationConfig, MigrationReport, Migrator, NoProgress, PassthroughMapper, run,
};
use talkport_store::{
    MemorySource, MemoryTarget, SourceAsset, SourceComment, SourceCommentStatus, SourceUser,
    SourceUserStatus, TargetStore, UserRole,
};

pub const TENANT: &str = "tenant-1";
pub const SITE: &str = "site-1";

pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn source_user(id: &str, role: UserRole) -> SourceUser {
    SourceUser {
        id: id.to_string(),
        role,
        created_at: at(0),
        status: SourceUserStatus::default(),
    }
}

pub fn source_asset(id: &str) -> SourceAsset {
    SourceAsset {
        id: id.to_string(),
        url: format!("https://news.example.com/{}", id),
        created_at: at(0),
    }
}

pub fn source_comment(
    id: &str,
    author: &str,
    asset: &str,
    parent: Option<&str>,
    status: SourceCommentStatus,
    minute: i64,
) -> SourceComment {
    SourceComment {
        id: id.to_string(),
        author_id: author.to_string(),
        asset_id: asset.to_string(),
        parent_id: parent.map(str::to_string),
        body: format!("comment {}", id),
        status,
        created_at: at(minute),
    }
}

/// A source store plus an empty target store.
pub struct World {
    pub source: Arc<MemorySource>,
    pub target: Arc<MemoryTarget>,
    minute: i64,
}

impl World {
    pub fn new() -> Self {
        Self {
            source: Arc::new(MemorySource::new()),
            target: Arc::new(MemoryTarget::new()),
            minute: 0,
        }
    }

    pub fn user(&mut self, id: &str) -> &mut Self {
        self.source.insert_user(source_user(id, UserRole::Commenter));
        self
    }

    pub fn asset(&mut self, id: &str) -> &mut Self {
        self.source.insert_asset(source_asset(id));
        self
    }

    /// Accepted comment created after everything added before it.
    pub fn comment(&mut self, id: &str, author: &str, asset: &str, parent: Option<&str>) -> &mut Self {
        self.comment_with_status(id, author, asset, parent, SourceCommentStatus::Accepted)
    }

    pub fn comment_with_status(
        &mut self,
        id: &str,
        author: &str,
        asset: &str,
        parent: Option<&str>,
        status: SourceCommentStatus,
    ) -> &mut Self {
        self.minute += 1;
        self.source
            .insert_comment(source_comment(id, author, asset, parent, status, self.minute));
        self
    }

    pub fn config(&self, dry_run: bool) -> MigrationConfig {
        MigrationConfig::new(TENANT, SITE)
            .unwrap()
            .with_dry_run(dry_run)
    }

    pub fn migrator(&self, dry_run: bool) -> Migrator {
        self.migrator_on(self.target.clone(), dry_run)
    }

    /// Migrator writing to a different target store.
    pub fn migrator_on(&self, target: Arc<dyn TargetStore>, dry_run: bool) -> Migrator {
        Migrator::new(
            self.config(dry_run),
            self.source.clone(),
            target,
            Arc::new(PassthroughMapper::new(self.source.clone())),
        )
        .unwrap()
    }

    pub async fn run(&self) -> MigrationReport {
        run(self.migrator(false), Box::new(NoProgress)).await.unwrap()
    }

    pub async fn dry_run(&self) -> MigrationReport {
        run(self.migrator(true), Box::new(NoProgress)).await.unwrap()
    }
}
