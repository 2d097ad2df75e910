//! Trait abstractions for git operations.
//!
//! This module defines the `GitOps` trait which abstracts the version-control
//! backend, enabling dependency injection and testability.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use git2::Oid;

use crate::{
    CommitMetadata, ConflictSide, Identity, InProgressOp, PickOutcome, PushOutcome, RefScope,
    ReflogEntry, Repository, Result, StashHandle, StashPop,
};

/// Trait for git repository operations.
///
/// This trait abstracts git operations, allowing for:
/// - Dependency injection in the migration engine and its collaborators
/// - Mock implementations for testing
///
/// All calls are synchronous and blocking.
#[allow(clippy::missing_errors_doc)]
pub trait GitOps {
    // === Repository Info ===

    /// Get the working directory path.
    fn workdir(&self) -> Option<&Path>;

    /// Get the current branch name, or `None` when HEAD is detached or unborn.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Get the commit HEAD points at.
    fn head_commit(&self) -> Result<Oid>;

    /// Report a merge, cherry-pick, revert or rebase left half-finished.
    fn in_progress_operation(&self) -> Option<InProgressOp>;

    /// Forcibly abort whatever [`GitOps::in_progress_operation`] reports.
    fn abort_in_progress(&self) -> Result<Option<InProgressOp>>;

    // === Refs and Branches ===

    /// Check if a branch exists in the given scope.
    fn ref_exists(&self, name: &str, scope: RefScope) -> bool;

    /// Create a branch at `start_point` without checking it out.
    fn create_branch(&self, name: &str, start_point: &str) -> Result<Oid>;

    /// Check out a local branch, or detach HEAD at any other revision.
    fn checkout(&self, name_or_ref: &str) -> Result<()>;

    /// Get the tip commit of a local branch.
    fn branch_commit(&self, branch: &str) -> Result<Oid>;

    /// Hard reset a branch to a specific commit.
    fn reset_branch(&self, branch: &str, commit: Oid) -> Result<()>;

    /// Reflog entries for a local branch, newest first.
    fn branch_reflog(&self, branch: &str, limit: usize) -> Result<Vec<ReflogEntry>>;

    // === Commits ===

    /// Commits reachable from `to` but not from `from`, oldest first in
    /// ancestry order.
    fn commit_range(&self, from: Oid, to: Oid) -> Result<Vec<Oid>>;

    /// Read author, dates and message of a commit.
    fn read_commit_metadata(&self, commit: Oid) -> Result<CommitMetadata>;

    /// First line of a commit's message.
    fn commit_summary(&self, commit: Oid) -> Result<String> {
        self.read_commit_metadata(commit)
            .map(|meta| meta.summary().to_string())
    }

    // === Replay ===

    /// Replay a commit onto HEAD, keeping its author and message.
    fn cherry_pick(&self, commit: Oid) -> Result<PickOutcome>;

    /// Resolve every conflicted path to one side.
    fn resolve_conflicts(&self, side: ConflictSide) -> Result<()>;

    /// Commit the resolved index of the cherry-pick in progress.
    fn cherry_pick_continue(&self) -> Result<PickOutcome>;

    /// Abandon the cherry-pick in progress.
    fn cherry_pick_abort(&self) -> Result<()>;

    /// Drop the current commit's changes so the next one can be replayed.
    fn cherry_pick_skip(&self) -> Result<()>;

    /// Rewrite HEAD's timestamps, optionally resetting the author identity.
    fn amend_current(
        &self,
        author_time: &DateTime<FixedOffset>,
        committer_time: &DateTime<FixedOffset>,
        reset_author: bool,
    ) -> Result<Oid>;

    // === Working Copy ===

    /// Check for staged, unstaged or untracked changes.
    fn is_clean(&self) -> Result<bool>;

    /// Stash tracked and untracked changes. Returns `None` if nothing was saved.
    fn stash_push(&self, label: &str) -> Result<Option<StashHandle>>;

    /// Pop the stash entry created by [`GitOps::stash_push`].
    fn stash_pop(&self, handle: &StashHandle) -> Result<StashPop>;

    // === Remote and Config ===

    /// Push a local branch to its counterpart on `remote`.
    fn push(&self, remote: &str, branch: &str) -> Result<PushOutcome>;

    /// The branch `refs/remotes/<remote>/HEAD` points at, if known.
    fn remote_default_branch(&self, remote: &str) -> Option<String>;

    /// The configured `user.name` / `user.email`.
    fn local_identity(&self) -> Result<Identity>;
}

impl GitOps for Repository {
    fn workdir(&self) -> Option<&Path> {
        Self::workdir(self)
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Self::current_branch(self)
    }

    fn head_commit(&self) -> Result<Oid> {
        Self::head_commit(self)
    }

    fn in_progress_operation(&self) -> Option<InProgressOp> {
        Self::in_progress_operation(self)
    }

    fn abort_in_progress(&self) -> Result<Option<InProgressOp>> {
        Self::abort_in_progress(self)
    }

    fn ref_exists(&self, name: &str, scope: RefScope) -> bool {
        Self::ref_exists(self, name, scope)
    }

    fn create_branch(&self, name: &str, start_point: &str) -> Result<Oid> {
        Self::create_branch(self, name, start_point)
    }

    fn checkout(&self, name_or_ref: &str) -> Result<()> {
        Self::checkout(self, name_or_ref)
    }

    fn branch_commit(&self, branch: &str) -> Result<Oid> {
        Self::branch_commit(self, branch)
    }

    fn reset_branch(&self, branch: &str, commit: Oid) -> Result<()> {
        Self::reset_branch(self, branch, commit)
    }

    fn branch_reflog(&self, branch: &str, limit: usize) -> Result<Vec<ReflogEntry>> {
        Self::branch_reflog(self, branch, limit)
    }

    fn commit_range(&self, from: Oid, to: Oid) -> Result<Vec<Oid>> {
        Self::commit_range(self, from, to)
    }

    fn read_commit_metadata(&self, commit: Oid) -> Result<CommitMetadata> {
        Self::read_commit_metadata(self, commit)
    }

    fn cherry_pick(&self, commit: Oid) -> Result<PickOutcome> {
        Self::cherry_pick(self, commit)
    }

    fn resolve_conflicts(&self, side: ConflictSide) -> Result<()> {
        Self::resolve_conflicts(self, side)
    }

    fn cherry_pick_continue(&self) -> Result<PickOutcome> {
        Self::cherry_pick_continue(self)
    }

    fn cherry_pick_abort(&self) -> Result<()> {
        Self::cherry_pick_abort(self)
    }

    fn cherry_pick_skip(&self) -> Result<()> {
        Self::cherry_pick_skip(self)
    }

    fn amend_current(
        &self,
        author_time: &DateTime<FixedOffset>,
        committer_time: &DateTime<FixedOffset>,
        reset_author: bool,
    ) -> Result<Oid> {
        Self::amend_current(self, author_time, committer_time, reset_author)
    }

    fn is_clean(&self) -> Result<bool> {
        Self::is_clean(self)
    }

    fn stash_push(&self, label: &str) -> Result<Option<StashHandle>> {
        Self::stash_push(self, label)
    }

    fn stash_pop(&self, handle: &StashHandle) -> Result<StashPop> {
        Self::stash_pop(self, handle)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<PushOutcome> {
        Self::push(self, remote, branch)
    }

    fn remote_default_branch(&self, remote: &str) -> Option<String> {
        Self::remote_default_branch(self, remote)
    }

    fn local_identity(&self) -> Result<Identity> {
        Self::local_identity(self)
    }
}
