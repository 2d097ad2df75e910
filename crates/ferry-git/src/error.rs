//! Error types for ferry-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Branch not found.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// Reference not found.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// Repository has no working directory.
    #[error("repository has no working directory")]
    BareRepository,

    /// HEAD does not point at a commit yet.
    #[error("HEAD has no commits yet")]
    UnbornHead,

    /// `user.name` or `user.email` is not configured.
    #[error("git user not configured - set user.name and user.email first")]
    MissingIdentity,

    /// Merge commits need a mainline and are not replayed.
    #[error("cannot replay merge commit {0}")]
    MergeCommit(String),

    /// No cherry-pick is in progress.
    #[error("no cherry-pick in progress")]
    NoCherryPick,

    /// Conflicts remain in the index.
    #[error("unresolved conflicts in: {0:?}")]
    UnresolvedConflicts(Vec<String>),

    /// Aborting a half-finished operation failed.
    #[error("could not abort {op}: {message}")]
    AbortFailed { op: String, message: String },

    /// Stash command failed.
    #[error("stash failed: {0}")]
    StashFailed(String),

    /// Push failed for a reason other than a remote rejection.
    #[error("push failed: {0}")]
    PushFailed(String),

    /// Commit timestamp could not be represented.
    #[error("invalid timestamp on commit {0}")]
    InvalidTimestamp(String),

    /// Spawning the git binary failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}
