//! Collection names and snapshot file layout.

/// v4 user collection.
pub const SOURCE_USERS: &str = "users";

/// v4 asset collection.
pub const SOURCE_ASSETS: &str = "assets";

/// v4 comment collection.
pub const SOURCE_COMMENTS: &str = "comments";

/// v6 user collection.
pub const TARGET_USERS: &str = "users";

/// v6 story collection.
pub const TARGET_STORIES: &str = "stories";

/// v6 comment collection.
pub const TARGET_COMMENTS: &str = "comments";

/// File name of a collection inside a snapshot directory.
pub fn snapshot_file(collection: &str) -> String {
    format!("{}.json", collection)
}
