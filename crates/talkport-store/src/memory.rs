//! In-memory stores backed by `DashMap`, persisted as JSON snapshots.
//!
//! A snapshot is a directory holding one JSON array per collection
//! (`users.json`, `comments.json`, ...). Missing files load as empty
//! collections so a fresh target directory needs no setup.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::records::{
    SOURCE_ASSETS, SOURCE_COMMENTS, SOURCE_USERS, TARGET_COMMENTS, TARGET_STORIES, TARGET_USERS,
    snapshot_file,
};
use crate::{
    SourceAsset, SourceComment, SourceStore, SourceUser, StoreError, StoryCounter, TargetComment,
    TargetStore, TargetStory, TargetUser,
};

fn load_collection<T: DeserializeOwned>(dir: &Path, collection: &str) -> Result<Vec<T>, StoreError> {
    let path = dir.join(snapshot_file(collection));
    if !path.exists() {
        debug!(path = %path.display(), "snapshot file missing, starting empty");
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&data)?)
}

fn save_collection<T: Serialize>(dir: &Path, collection: &str, docs: &[T]) -> Result<(), StoreError> {
    let path = dir.join(snapshot_file(collection));
    let data = serde_json::to_string_pretty(docs)?;
    fs::write(&path, data)?;
    Ok(())
}

/// Clone every value out of a map, ordered by key.
fn sorted_values<V: Clone>(map: &DashMap<String, V>) -> Vec<V> {
    let mut entries: Vec<(String, V)> = map
        .iter()
        .map(|e| (e.key().clone(), e.value().clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(_, v)| v).collect()
}

// =============================================================================
// Source
// =============================================================================

/// In-memory v4 store.
#[derive(Default)]
pub struct MemorySource {
    users: DashMap<String, SourceUser>,
    assets: DashMap<String, SourceAsset>,
    comments: DashMap<String, SourceComment>,
}

impl MemorySource {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a v4 snapshot directory.
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let store = Self::new();
        for user in load_collection::<SourceUser>(dir, SOURCE_USERS)? {
            store.insert_user(user);
        }
        for asset in load_collection::<SourceAsset>(dir, SOURCE_ASSETS)? {
            store.insert_asset(asset);
        }
        for comment in load_collection::<SourceComment>(dir, SOURCE_COMMENTS)? {
            store.insert_comment(comment);
        }
        info!(
            dir = %dir.display(),
            users = store.users.len(),
            assets = store.assets.len(),
            comments = store.comments.len(),
            "loaded source snapshot"
        );
        Ok(store)
    }

    pub fn insert_user(&self, user: SourceUser) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_asset(&self, asset: SourceAsset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    pub fn insert_comment(&self, comment: SourceComment) {
        self.comments.insert(comment.id.clone(), comment);
    }

    fn accepted_where(&self, reply: bool) -> Vec<SourceComment> {
        let mut comments: Vec<SourceComment> = self
            .comments
            .iter()
            .filter(|c| c.is_accepted() && c.is_reply() == reply)
            .map(|c| c.value().clone())
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        comments
    }
}

#[async_trait]
impl SourceStore for MemorySource {
    async fn user(&self, id: &str) -> Result<Option<SourceUser>, StoreError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn asset(&self, id: &str) -> Result<Option<SourceAsset>, StoreError> {
        Ok(self.assets.get(id).map(|a| a.value().clone()))
    }

    async fn comment(&self, id: &str) -> Result<Option<SourceComment>, StoreError> {
        Ok(self.comments.get(id).map(|c| c.value().clone()))
    }

    async fn accepted_roots(&self) -> Result<Vec<SourceComment>, StoreError> {
        Ok(self.accepted_where(false))
    }

    async fn accepted_replies(&self) -> Result<Vec<SourceComment>, StoreError> {
        Ok(self.accepted_where(true))
    }
}

// =============================================================================
// Target
// =============================================================================

/// Point-in-time copy of every document in a [`MemoryTarget`], ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetSnapshot {
    pub users: Vec<TargetUser>,
    pub stories: Vec<TargetStory>,
    pub comments: Vec<TargetComment>,
}

/// In-memory v6 store.
#[derive(Default)]
pub struct MemoryTarget {
    users: DashMap<String, TargetUser>,
    stories: DashMap<String, TargetStory>,
    comments: DashMap<String, TargetComment>,
}

impl MemoryTarget {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a v6 snapshot directory. A missing directory loads as empty.
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let store = Self::new();
        for user in load_collection::<TargetUser>(dir, TARGET_USERS)? {
            store.users.insert(user.id.clone(), user);
        }
        for story in load_collection::<TargetStory>(dir, TARGET_STORIES)? {
            store.stories.insert(story.id.clone(), story);
        }
        for comment in load_collection::<TargetComment>(dir, TARGET_COMMENTS)? {
            store.comments.insert(comment.id.clone(), comment);
        }
        info!(
            dir = %dir.display(),
            users = store.users.len(),
            stories = store.stories.len(),
            comments = store.comments.len(),
            "loaded target snapshot"
        );
        Ok(store)
    }

    /// Write every collection to `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(dir)?;
        let snapshot = self.snapshot();
        save_collection(dir, TARGET_USERS, &snapshot.users)?;
        save_collection(dir, TARGET_STORIES, &snapshot.stories)?;
        save_collection(dir, TARGET_COMMENTS, &snapshot.comments)?;
        info!(
            dir = %dir.display(),
            users = snapshot.users.len(),
            stories = snapshot.stories.len(),
            comments = snapshot.comments.len(),
            "saved target snapshot"
        );
        Ok(())
    }

    /// Copy out the current contents.
    pub fn snapshot(&self) -> TargetSnapshot {
        TargetSnapshot {
            users: sorted_values(&self.users),
            stories: sorted_values(&self.stories),
            comments: sorted_values(&self.comments),
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

#[async_trait]
impl TargetStore for MemoryTarget {
    async fn user(&self, id: &str) -> Result<Option<TargetUser>, StoreError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn upsert_user(&self, user: &TargetUser) -> Result<(), StoreError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn story(&self, id: &str) -> Result<Option<TargetStory>, StoreError> {
        Ok(self.stories.get(id).map(|s| s.value().clone()))
    }

    async fn insert_story(&self, story: &TargetStory) -> Result<(), StoreError> {
        match self.stories.entry(story.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                collection: TARGET_STORIES,
                id: story.id.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(story.clone());
                Ok(())
            }
        }
    }

    async fn increment_story_counter(
        &self,
        story_id: &str,
        counter: StoryCounter,
    ) -> Result<(), StoreError> {
        let mut story = self
            .stories
            .get_mut(story_id)
            .ok_or_else(|| StoreError::NotFound {
                collection: TARGET_STORIES,
                id: story_id.to_string(),
            })?;
        story.comment_counts.increment(counter, 1);
        Ok(())
    }

    async fn comment(&self, id: &str) -> Result<Option<TargetComment>, StoreError> {
        Ok(self.comments.get(id).map(|c| c.value().clone()))
    }

    async fn insert_comment(&self, comment: &TargetComment) -> Result<(), StoreError> {
        match self.comments.entry(comment.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                collection: TARGET_COMMENTS,
                id: comment.id.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(comment.clone());
                Ok(())
            }
        }
    }

    async fn remove_comment(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.comments.remove(id).is_some())
    }

    async fn append_child(
        &self,
        parent_id: &str,
        child_id: &str,
    ) -> Result<TargetComment, StoreError> {
        let mut parent = self
            .comments
            .get_mut(parent_id)
            .ok_or_else(|| StoreError::NotFound {
                collection: TARGET_COMMENTS,
                id: parent_id.to_string(),
            })?;
        parent.child_ids.push(child_id.to_string());
        parent.child_count += 1;
        Ok(parent.value().clone())
    }

    async fn has_comment(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.comments.contains_key(id))
    }
}
