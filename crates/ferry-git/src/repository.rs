//! Repository wrapper providing high-level git operations.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use git2::{BranchType, ErrorCode, Oid, RepositoryState, Sort, StatusOptions};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{CommitMetadata, Identity, InProgressOp, RefScope, ReflogEntry};

/// High-level wrapper around a git repository.
pub struct Repository {
    pub(crate) inner: git2::Repository,
}

impl Repository {
    /// Open the repository rooted exactly at `path`.
    ///
    /// # Errors
    /// Returns error if `path` is not a repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::open(path)?;
        Ok(Self { inner })
    }

    /// Get the path to the repository root (workdir).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Get the current repository state.
    #[must_use]
    pub fn state(&self) -> RepositoryState {
        self.inner.state()
    }

    /// Map the repository state onto the operations ferry knows how to abort.
    #[must_use]
    pub fn in_progress_operation(&self) -> Option<InProgressOp> {
        match self.state() {
            RepositoryState::Merge => Some(InProgressOp::Merge),
            RepositoryState::CherryPick | RepositoryState::CherryPickSequence => {
                Some(InProgressOp::CherryPick)
            }
            RepositoryState::Revert | RepositoryState::RevertSequence => Some(InProgressOp::Revert),
            RepositoryState::Rebase
            | RepositoryState::RebaseInteractive
            | RepositoryState::RebaseMerge
            | RepositoryState::ApplyMailboxOrRebase => Some(InProgressOp::Rebase),
            RepositoryState::Clean | RepositoryState::Bisect | RepositoryState::ApplyMailbox => {
                None
            }
        }
    }

    // === Branch operations ===

    /// Get the name of the current branch.
    ///
    /// Returns `None` when HEAD is detached or the branch has no commits yet.
    ///
    /// # Errors
    /// Returns error if HEAD cannot be read.
    pub fn current_branch(&self) -> Result<Option<String>> {
        match self.inner.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(String::from)),
            Ok(_) => Ok(None),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the commit HEAD points at.
    ///
    /// # Errors
    /// Returns `UnbornHead` if there are no commits yet.
    pub fn head_commit(&self) -> Result<Oid> {
        let head = self.inner.head().map_err(|e| match e.code() {
            ErrorCode::UnbornBranch | ErrorCode::NotFound => Error::UnbornHead,
            _ => Error::Git2(e),
        })?;
        Ok(head.peel_to_commit()?.id())
    }

    /// Check if a branch exists in the given scope.
    #[must_use]
    pub fn ref_exists(&self, name: &str, scope: RefScope) -> bool {
        let branch_type = match scope {
            RefScope::Local => BranchType::Local,
            RefScope::Remote => BranchType::Remote,
        };
        self.inner.find_branch(name, branch_type).is_ok()
    }

    /// Get the commit SHA for a branch.
    ///
    /// # Errors
    /// Returns error if branch doesn't exist.
    pub fn branch_commit(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .inner
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(branch_name.into()))?;

        branch
            .get()
            .target()
            .ok_or_else(|| Error::BranchNotFound(branch_name.into()))
    }

    /// Create a new branch at `start_point` without checking it out.
    ///
    /// `start_point` is any revision git understands: a branch, a remote
    /// branch such as `origin/main`, a commit id or `HEAD`.
    ///
    /// # Errors
    /// Returns error if the start point cannot be resolved or the branch exists.
    pub fn create_branch(&self, name: &str, start_point: &str) -> Result<Oid> {
        let start = self
            .inner
            .revparse_single(start_point)
            .map_err(|_| Error::RefNotFound(start_point.into()))?
            .peel_to_commit()?;
        let branch = self.inner.branch(name, &start, false)?;
        debug!(branch = name, start_point, "created branch");

        branch
            .get()
            .target()
            .ok_or_else(|| Error::BranchNotFound(name.into()))
    }

    /// Checkout a local branch, or detach HEAD at any other revision.
    ///
    /// # Errors
    /// Returns error if the revision is unknown or local changes would be
    /// overwritten.
    pub fn checkout(&self, name_or_ref: &str) -> Result<()> {
        if let Ok(branch) = self.inner.find_branch(name_or_ref, BranchType::Local) {
            let object = branch.get().peel(git2::ObjectType::Commit)?;

            self.inner.checkout_tree(&object, None)?;
            self.inner.set_head(&format!("refs/heads/{name_or_ref}"))?;
            debug!(branch = name_or_ref, "checked out branch");
            return Ok(());
        }

        let commit = self
            .inner
            .revparse_single(name_or_ref)
            .map_err(|_| Error::RefNotFound(name_or_ref.into()))?
            .peel_to_commit()?;

        self.inner.checkout_tree(commit.as_object(), None)?;
        self.inner.set_head_detached(commit.id())?;
        debug!(rev = name_or_ref, "checked out detached HEAD");

        Ok(())
    }

    // === Working directory state ===

    /// Check if the working directory is clean.
    ///
    /// Untracked files count as changes; ignored files do not.
    ///
    /// # Errors
    /// Returns error if status check fails.
    pub fn is_clean(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self.inner.statuses(Some(&mut opts))?;
        Ok(statuses.is_empty())
    }

    // === Commit operations ===

    /// Get a commit by its SHA.
    ///
    /// # Errors
    /// Returns error if commit not found.
    pub fn find_commit(&self, oid: Oid) -> Result<git2::Commit<'_>> {
        Ok(self.inner.find_commit(oid)?)
    }

    /// List commits reachable from `to` but not `from`, parents before children.
    ///
    /// # Errors
    /// Returns error if revwalk fails.
    pub fn commit_range(&self, from: Oid, to: Oid) -> Result<Vec<Oid>> {
        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(to)?;
        revwalk.hide(from)?;

        Ok(revwalk.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Read the metadata of a commit.
    ///
    /// # Errors
    /// Returns error if the commit is missing or carries an invalid timestamp.
    pub fn read_commit_metadata(&self, oid: Oid) -> Result<CommitMetadata> {
        let commit = self.inner.find_commit(oid)?;
        let author = commit.author();
        let committer = commit.committer();
        let invalid = || Error::InvalidTimestamp(oid.to_string());

        Ok(CommitMetadata {
            id: oid,
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            author_date: from_git_time(author.when()).ok_or_else(invalid)?,
            committer_date: from_git_time(committer.when()).ok_or_else(invalid)?,
            message: String::from_utf8_lossy(commit.message_raw_bytes()).into_owned(),
        })
    }

    // === Reset operations ===

    /// Hard reset a branch to a specific commit.
    ///
    /// # Errors
    /// Returns error if reset fails.
    pub fn reset_branch(&self, branch_name: &str, target: Oid) -> Result<()> {
        let commit = self.inner.find_commit(target)?;
        let reference_name = format!("refs/heads/{branch_name}");

        self.inner.reference(
            &reference_name,
            target,
            true, // force
            &format!("ferry: reset to {}", crate::short_id(target)),
        )?;

        // If this is the current branch, also update working directory
        if self.current_branch()?.as_deref() == Some(branch_name) {
            self.inner
                .reset(commit.as_object(), git2::ResetType::Hard, None)?;
        }
        debug!(branch = branch_name, target = %target, "reset branch");

        Ok(())
    }

    /// Read a branch's reflog, newest entry first.
    ///
    /// # Errors
    /// Returns error if the reflog cannot be read.
    pub fn branch_reflog(&self, branch_name: &str, limit: usize) -> Result<Vec<ReflogEntry>> {
        let reflog = self.inner.reflog(&format!("refs/heads/{branch_name}"))?;

        Ok(reflog
            .iter()
            .take(limit)
            .map(|entry| ReflogEntry {
                id: entry.id_new(),
                message: entry.message().unwrap_or_default().to_string(),
            })
            .collect())
    }

    // === Remote and config ===

    /// The branch `refs/remotes/<remote>/HEAD` points at.
    ///
    /// Returns `None` when the pointer is missing, not symbolic, or would
    /// dereference to the literal `HEAD`.
    #[must_use]
    pub fn remote_default_branch(&self, remote: &str) -> Option<String> {
        let reference = self
            .inner
            .find_reference(&format!("refs/remotes/{remote}/HEAD"))
            .ok()?;
        let target = reference.symbolic_target()?;
        let name = target.strip_prefix(&format!("refs/remotes/{remote}/"))?;

        (!name.is_empty() && name != "HEAD").then(|| name.to_string())
    }

    /// Get the operator's configured identity.
    ///
    /// # Errors
    /// Returns `MissingIdentity` if `user.name` or `user.email` is unset or empty.
    pub fn local_identity(&self) -> Result<Identity> {
        let config = self.inner.config()?;
        let read = |key: &str| {
            config
                .get_string(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        match (read("user.name"), read("user.email")) {
            (Some(name), Some(email)) => Ok(Identity { name, email }),
            _ => Err(Error::MissingIdentity),
        }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}

pub(crate) fn to_git_time(at: &DateTime<FixedOffset>) -> git2::Time {
    git2::Time::new(at.timestamp(), at.offset().local_minus_utc() / 60)
}

pub(crate) fn from_git_time(time: git2::Time) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)?;
    DateTime::from_timestamp(time.seconds(), 0).map(|utc| utc.with_timezone(&offset))
}
