//! Recover the work branch from its reflog.

use ferry_git::{GitOps, Oid, RefScope, ReflogEntry};
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::queue::PendingQueue;
use crate::resolver::BaseResolver;

/// Reflog entries inspected when looking for a restore point.
pub const REFLOG_DEPTH: usize = 20;

/// Where the work branch was restored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredWork {
    pub commit: Oid,
    /// Reflog message of the entry that was restored.
    pub message: String,
    pub base: String,
    pub pending: usize,
}

/// Reset the work branch to its newest reflog state that is neither a
/// branch creation nor a reset onto base.
///
/// # Errors
/// - `WorkBranchMissing` if the work branch does not exist
/// - `DirtyWorkingCopy` if work is checked out with uncommitted changes
/// - `NoRestorePoint` if no reflog entry qualifies
pub fn restore_work_branch<G: GitOps>(repo: &G, config: &Config) -> Result<RestoredWork> {
    let work = &config.branches.work;
    if !repo.ref_exists(work, RefScope::Local) {
        return Err(Error::WorkBranchMissing(work.clone()));
    }
    if repo.current_branch()?.as_deref() == Some(work.as_str()) && !repo.is_clean()? {
        return Err(Error::DirtyWorkingCopy);
    }

    let base = BaseResolver::from_config(config).resolve(repo);
    let base_tip = repo.branch_commit(&base).ok();

    let entries = repo.branch_reflog(work, REFLOG_DEPTH)?;
    let point = entries
        .into_iter()
        .find(|entry| !is_creation(entry) && !is_reset_onto_base(entry, &base, base_tip))
        .ok_or_else(|| Error::NoRestorePoint(work.clone()))?;

    repo.reset_branch(work, point.id)?;
    let pending = PendingQueue::compute(repo, &base, work)?.len();
    info!(work = %work, commit = %point.id, pending, "restored work branch");

    Ok(RestoredWork {
        commit: point.id,
        message: point.message,
        base,
        pending,
    })
}

fn is_creation(entry: &ReflogEntry) -> bool {
    entry.message.starts_with("branch: Created from")
}

fn is_reset_onto_base(entry: &ReflogEntry, base: &str, base_tip: Option<Oid>) -> bool {
    if entry.message == format!("reset: moving to {base}") {
        return true;
    }
    let is_reset = entry.message.starts_with("reset:") || entry.message.starts_with("ferry: reset");
    is_reset && Some(entry.id) == base_tip
}
