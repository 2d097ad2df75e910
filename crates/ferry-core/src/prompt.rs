//! Decisions the operator supplies while a migration runs.
//!
//! The engine blocks on these calls; there is no timeout and no default.

use ferry_git::{CommitMetadata, ConflictSide};

/// How to proceed after a replay conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Keep the base side and discard the incoming change.
    Ours,
    /// Take the incoming change verbatim.
    Theirs,
    /// Stop the whole run and leave the conflict for manual resolution.
    Abort,
    /// Drop this commit only and continue with the next.
    Skip,
}

impl ConflictChoice {
    /// The side to resolve to, for the two resolving choices.
    #[must_use]
    pub const fn side(self) -> Option<ConflictSide> {
        match self {
            Self::Ours => Some(ConflictSide::Ours),
            Self::Theirs => Some(ConflictSide::Theirs),
            Self::Abort | Self::Skip => None,
        }
    }
}

/// Decisions needed by the migration engine.
pub trait MigrationPrompt {
    /// Choose how to handle a conflicted commit.
    fn decide_conflict(&self, commit: &CommitMetadata, files: &[String]) -> ConflictChoice;

    /// Step mode: confirm the next commit before it is replayed.
    fn confirm_commit(&self, commit: &CommitMetadata, position: usize, total: usize) -> bool;
}

/// Decisions needed by the work-branch reconciler.
pub trait ReconcilePrompt {
    /// Offer to rewrite the work branch down to `remaining` commits.
    fn confirm_rewrite(&self, work: &str, remaining: usize) -> bool;
}

/// Decisions needed by the uncommitted-change guard.
pub trait StashPrompt {
    /// Allow stashing uncommitted changes for the duration of an operation.
    fn confirm_stash(&self, branch: Option<&str>) -> bool;
}

/// Accepts every confirmation and aborts on conflict.
///
/// For unattended runs where nobody can answer a conflict prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unattended;

impl MigrationPrompt for Unattended {
    fn decide_conflict(&self, _commit: &CommitMetadata, _files: &[String]) -> ConflictChoice {
        ConflictChoice::Abort
    }

    fn confirm_commit(&self, _commit: &CommitMetadata, _position: usize, _total: usize) -> bool {
        true
    }
}

impl ReconcilePrompt for Unattended {
    fn confirm_rewrite(&self, _work: &str, _remaining: usize) -> bool {
        true
    }
}

impl StashPrompt for Unattended {
    fn confirm_stash(&self, _branch: Option<&str>) -> bool {
        true
    }
}
