//! # ferry-git
//!
//! Git backend for Ferry, built on git2-rs.
//! Provides branch and ref inspection, commit replay with conflict
//! resolution, timestamp amendment, stashing and pushing.

mod cli;
mod error;
mod replay;
mod repository;
mod traits;
mod types;

pub use error::{Error, Result};
pub use git2::Oid;
pub use repository::Repository;
pub use traits::GitOps;
pub use types::{
    CommitMetadata, ConflictSide, Identity, InProgressOp, PickOutcome, PushOutcome, RefScope,
    ReflogEntry, StashHandle, StashPop,
};

/// Abbreviate a commit id for display.
#[must_use]
pub fn short_id(oid: Oid) -> String {
    let full = oid.to_string();
    full[..7.min(full.len())].to_string()
}
