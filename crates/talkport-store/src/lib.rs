//! Document stores for the talkport migration.
//!
//! This crate defines the documents on both sides of the migration and the
//! store clients the engine talks to.
//!
//! ## Features
//!
//! - **Types**: v4 source documents and v6 target documents with their
//!   on-disk field names
//! - **Clients**: `SourceStore` and `TargetStore` traits, including the
//!   atomic child-append and counter-increment operations
//! - **Memory**: DashMap-backed stores persisted as JSON snapshot directories

mod client;
mod error;
pub mod memory;
pub mod records;
mod types;

pub use client::{SourceStore, TargetStore};
pub use error::StoreError;
pub use memory::{MemorySource, MemoryTarget, TargetSnapshot};
pub use types::*;
