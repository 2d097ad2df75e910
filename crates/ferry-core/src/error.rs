//! Error types for ferry-core.

use std::path::PathBuf;

use crate::validate::ValidationReport;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ferry-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `user.name` / `user.email` not configured.
    #[error("git user not configured - set user.name and user.email first")]
    MissingIdentity,

    /// Base branch exists neither locally nor on the remote.
    #[error("base branch '{0}' not found locally or on the remote")]
    BaseMissing(String),

    /// Work branch does not exist.
    #[error("work branch '{0}' does not exist")]
    WorkBranchMissing(String),

    /// Working copy has changes and stashing was declined.
    #[error("working copy has uncommitted changes")]
    DirtyWorkingCopy,

    /// Requested prefix length is outside `1..=available`.
    #[error("cannot move {requested} commit(s): {available} pending")]
    InvalidSelection { requested: usize, available: usize },

    /// Replay failed for a reason other than a conflict or an empty apply.
    #[error("replay of {commit} failed: {message}")]
    ReplayFailed { commit: String, message: String },

    /// Moved commits failed the pre-push checks.
    #[error("pre-push validation failed: {0}")]
    ValidationFailed(ValidationReport),

    /// The remote refused the push.
    #[error("push of '{branch}' was rejected - update the branch and retry: {reason}")]
    PushRejected { branch: String, reason: String },

    /// Stashed changes could not be put back.
    #[error("stashed changes need manual recovery: {0}")]
    StashRestoreFailed(String),

    /// No usable reflog entry for the work branch.
    #[error("no earlier state of '{0}' found in its reflog")]
    NoRestorePoint(String),

    /// Configuration values are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Scan root is not a directory.
    #[error("directory not found: {}", .0.display())]
    NotADirectory(PathBuf),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Git operation error.
    #[error("git error: {0}")]
    Git(ferry_git::Error),
}

impl From<ferry_git::Error> for Error {
    fn from(err: ferry_git::Error) -> Self {
        match err {
            ferry_git::Error::MissingIdentity => Self::MissingIdentity,
            other => Self::Git(other),
        }
    }
}
