//! Document types for the v4 source schema and the v6 target schema.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Source (v4) documents
// =============================================================================

/// Moderation status of a v4 comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceCommentStatus {
    Accepted,
    Rejected,
    Premod,
    None,
    SystemWithheld,
}

/// Role of a user, shared between v4 and v6.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Moderator,
    Staff,
    #[default]
    Commenter,
}

impl UserRole {
    /// Whether this role carries moderation privileges.
    pub fn is_elevated(&self) -> bool {
        *self == UserRole::Moderator
    }
}

/// A v4 comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceComment {
    pub id: String,
    pub author_id: String,
    pub asset_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub body: String,
    pub status: SourceCommentStatus,
    pub created_at: DateTime<Utc>,
}

impl SourceComment {
    /// Whether this comment is in migration scope.
    pub fn is_accepted(&self) -> bool {
        self.status == SourceCommentStatus::Accepted
    }

    /// Whether this comment is a reply to another comment.
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// A single username change in v4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUsernameChange {
    #[serde(default)]
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Username sub-document of a v4 user status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceUsernameStatus {
    #[serde(default)]
    pub history: Vec<SourceUsernameChange>,
}

/// Status sub-document of a v4 user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceUserStatus {
    #[serde(default)]
    pub username: SourceUsernameStatus,
}

/// A v4 user. The id is the user's email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUser {
    pub id: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: SourceUserStatus,
}

impl SourceUser {
    /// Timestamp of the first recorded username, if any.
    pub fn first_username_at(&self) -> Option<DateTime<Utc>> {
        self.status.username.history.first().map(|h| h.created_at)
    }
}

/// A v4 asset (the page a comment thread hangs off).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAsset {
    pub id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Target (v6) documents
// =============================================================================

/// Authentication profile linked to a v6 user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Profile {
    /// Single sign-on profile keyed by the target user id.
    Sso {
        id: String,
        #[serde(rename = "lastIssuedAt")]
        last_issued_at: DateTime<Utc>,
    },
    /// Local (email/password) profile keyed by the email.
    Local { id: String },
}

/// A username history entry in v6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameHistoryEntry {
    pub id: String,
    pub username: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsernameStatus {
    pub history: Vec<UsernameHistoryEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStatus {
    pub history: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToggleStatus {
    pub active: bool,
    pub history: Vec<serde_json::Value>,
}

/// Moderation status sub-document of a v6 user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStatus {
    pub username: UsernameStatus,
    pub suspension: HistoryStatus,
    pub ban: ToggleStatus,
    pub premod: ToggleStatus,
}

/// How often a user receives notification digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DigestFrequency {
    #[default]
    None,
    Daily,
    Hourly,
}

/// Notification preferences. Everything is off for migrated users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub on_reply: bool,
    pub on_featured: bool,
    pub on_moderation: bool,
    pub on_staff_replies: bool,
    pub digest_frequency: DigestFrequency,
}

/// A v6 user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetUser {
    pub id: String,
    #[serde(rename = "tenantID")]
    pub tenant_id: String,
    pub email: String,
    pub username: Option<String>,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    pub status: UserStatus,
    pub notifications: NotificationSettings,
    pub profiles: Vec<Profile>,
    pub created_at: DateTime<Utc>,
}

/// Comment counts by moderation status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StatusCounts {
    pub approved: i64,
    pub none: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationQueueCounts {
    pub total: i64,
}

/// Aggregated comment counters on a v6 story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCounts {
    pub action: BTreeMap<String, i64>,
    pub status: StatusCounts,
    pub moderation_queue: ModerationQueueCounts,
}

/// A named counter on a v6 story that can be incremented atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryCounter {
    /// `commentCounts.status.APPROVED`
    Approved,
}

impl CommentCounts {
    /// Apply an increment to the named counter.
    pub fn increment(&mut self, counter: StoryCounter, by: i64) {
        match counter {
            StoryCounter::Approved => self.status.approved += by,
        }
    }
}

/// A v6 story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetStory {
    pub id: String,
    #[serde(rename = "tenantID")]
    pub tenant_id: String,
    #[serde(rename = "siteID")]
    pub site_id: String,
    pub url: String,
    pub comment_counts: CommentCounts,
    pub settings: serde_json::Map<String, serde_json::Value>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Status of a v6 comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetCommentStatus {
    None,
    Approved,
    Rejected,
    Premod,
    SystemWithheld,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMetadata {
    pub nudge: bool,
    pub link_count: u32,
}

/// One revision of a v6 comment body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    pub body: String,
    pub action_counts: BTreeMap<String, i64>,
    pub metadata: RevisionMetadata,
    pub created_at: DateTime<Utc>,
}

/// A v6 comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetComment {
    pub id: String,
    #[serde(rename = "tenantID")]
    pub tenant_id: String,
    #[serde(rename = "siteID")]
    pub site_id: String,
    #[serde(rename = "storyID")]
    pub story_id: String,
    #[serde(rename = "authorID")]
    pub author_id: String,
    pub revisions: Vec<Revision>,
    #[serde(rename = "parentID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(
        rename = "parentRevisionID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_revision_id: Option<String>,
    #[serde(rename = "ancestorIDs")]
    pub ancestor_ids: Vec<String>,
    #[serde(rename = "childIDs")]
    pub child_ids: Vec<String>,
    pub child_count: u32,
    pub tags: Vec<String>,
    pub status: TargetCommentStatus,
    pub action_counts: BTreeMap<String, i64>,
    pub created_at: DateTime<Utc>,
}

impl TargetComment {
    /// Id of the first revision, which replies link to.
    pub fn first_revision_id(&self) -> Option<&str> {
        self.revisions.first().map(|r| r.id.as_str())
    }
}
