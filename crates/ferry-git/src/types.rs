//! Value types exchanged across the git backend boundary.

use chrono::{DateTime, FixedOffset};
use git2::Oid;

/// Where to look up a branch name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefScope {
    /// `refs/heads/<name>`.
    Local,
    /// `refs/remotes/<name>`, with `name` given as `<remote>/<branch>`.
    Remote,
}

/// Result of replaying a single commit onto HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// The change applied cleanly and a new commit was created.
    Applied(Oid),
    /// HEAD already contains the change; no commit was created.
    Empty,
    /// The change conflicts with HEAD. The repository is left mid-cherry-pick.
    Conflict(Vec<String>),
}

/// Which side of a conflicted path to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSide {
    /// The branch being replayed onto.
    Ours,
    /// The incoming commit.
    Theirs,
}

impl std::fmt::Display for ConflictSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Theirs => write!(f, "theirs"),
        }
    }
}

/// Commit metadata needed for previews and push validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub id: Oid,
    pub author_name: String,
    pub author_email: String,
    pub author_date: DateTime<FixedOffset>,
    pub committer_date: DateTime<FixedOffset>,
    pub message: String,
}

impl CommitMetadata {
    /// First line of the commit message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// The operator's configured `user.name` / `user.email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// A stash entry created by ferry.
///
/// Identified by the stash commit id so it can be found again even if other
/// stashes were pushed on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashHandle {
    pub id: Oid,
    pub label: String,
}

/// Result of popping a stash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashPop {
    /// Changes were restored and the stash entry dropped.
    Restored,
    /// Pop produced conflicts; the stash entry is kept.
    Conflicted(Vec<String>),
    /// No stash entry with the recorded id exists.
    NotFound,
}

/// Result of pushing a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    /// The remote refused the update (e.g. it moved concurrently).
    Rejected(String),
}

/// A half-finished operation recorded in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InProgressOp {
    Merge,
    CherryPick,
    Revert,
    Rebase,
}

impl std::fmt::Display for InProgressOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Merge => "merge",
            Self::CherryPick => "cherry-pick",
            Self::Revert => "revert",
            Self::Rebase => "rebase",
        };
        f.write_str(name)
    }
}

/// A single reflog entry, newest first when listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflogEntry {
    pub id: Oid,
    pub message: String,
}
