//! Error types for the document stores.

use thiserror::Error;

/// Errors that can occur when reading from or writing to a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document not found.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: &'static str, id: String },

    /// Conditional insert refused because the id is already taken.
    #[error("document already exists: {collection}/{id}")]
    Duplicate { collection: &'static str, id: String },

    /// IO error while loading or saving a snapshot.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backing store rejected or failed the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
