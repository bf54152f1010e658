//! Client traits for the source and target document stores.
//!
//! The migration engine only talks to these traits, so a real database
//! driver, the in-memory stores in [`crate::memory`], or a test fake can be
//! plugged in without touching the engine.

use async_trait::async_trait;

use crate::{
    SourceAsset, SourceComment, SourceUser, StoreError, StoryCounter, TargetComment, TargetStory,
    TargetUser,
};

/// Read-only access to the v4 store.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Fetch a user by id.
    async fn user(&self, id: &str) -> Result<Option<SourceUser>, StoreError>;

    /// Fetch an asset by id.
    async fn asset(&self, id: &str) -> Result<Option<SourceAsset>, StoreError>;

    /// Fetch a comment by id.
    async fn comment(&self, id: &str) -> Result<Option<SourceComment>, StoreError>;

    /// All `ACCEPTED` comments without a parent, oldest first.
    async fn accepted_roots(&self) -> Result<Vec<SourceComment>, StoreError>;

    /// All `ACCEPTED` comments with a parent, oldest first.
    async fn accepted_replies(&self) -> Result<Vec<SourceComment>, StoreError>;
}

/// Read/write access to the v6 store.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Fetch a user by id.
    async fn user(&self, id: &str) -> Result<Option<TargetUser>, StoreError>;

    /// Insert or replace a user keyed by its id.
    async fn upsert_user(&self, user: &TargetUser) -> Result<(), StoreError>;

    /// Fetch a story by id.
    async fn story(&self, id: &str) -> Result<Option<TargetStory>, StoreError>;

    /// Insert a story. Fails with [`StoreError::Duplicate`] if the id exists.
    async fn insert_story(&self, story: &TargetStory) -> Result<(), StoreError>;

    /// Atomically increment a counter on a story.
    async fn increment_story_counter(
        &self,
        story_id: &str,
        counter: StoryCounter,
    ) -> Result<(), StoreError>;

    /// Fetch a comment by id.
    async fn comment(&self, id: &str) -> Result<Option<TargetComment>, StoreError>;

    /// Insert a comment. Fails with [`StoreError::Duplicate`] if the id exists.
    async fn insert_comment(&self, comment: &TargetComment) -> Result<(), StoreError>;

    /// Delete a comment. Returns whether it existed.
    async fn remove_comment(&self, id: &str) -> Result<bool, StoreError>;

    /// Atomically push `child_id` onto the parent's child list and bump its
    /// child count. Returns the parent as it is after the update.
    async fn append_child(
        &self,
        parent_id: &str,
        child_id: &str,
    ) -> Result<TargetComment, StoreError>;

    /// Whether a comment with this id exists.
    async fn has_comment(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.comment(id).await?.is_some())
    }
}
