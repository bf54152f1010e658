//! Migration engine for talkport.
//!
//! Moves users, stories and comments from a v4 comment platform store into
//! a v6 store:
//! - Identity mapping from source ids to target ids
//! - One migrator per entity kind, each idempotent
//! - A scheduler that migrates roots first, then sweeps replies so every
//!   comment lands after its parent
//! - Cascading failure: a comment whose ancestor cannot migrate is reported,
//!   never written

mod comment;
mod config;
mod driver;
mod error;
mod identity;
mod migrator;
mod scheduler;
mod story;
mod types;
mod user;

#[cfg(test)]
mod testing;

pub use config::MigrationConfig;
pub use driver::run;
pub use error::{EntityKind, MigrateError};
pub use identity::{
    IdentityMapper, IdentityTables, PassthroughMapper, StoryEntry, StoryMapping, TableMapper,
    UserEntry, UserMapping,
};
pub use migrator::{Migrator, Outcome};
pub use scheduler::{CommentTreeScheduler, LogProgress, NoProgress, Pass, Progress};
pub use types::{BlockReason, CommentState, MigrationReport, PassStats};
