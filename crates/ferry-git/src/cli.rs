//! Operations delegated to the `git` binary: stashing with untracked files,
//! pushing, and aborting half-finished merges, picks and rebases.

use std::process::{Command, Output};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::repository::Repository;
use crate::types::{InProgressOp, PushOutcome, StashHandle, StashPop};

/// Stderr fragments git prints when the remote refuses a ref update.
const REJECTION_MARKERS: &[&str] = &[
    "[rejected]",
    "[remote rejected]",
    "non-fast-forward",
    "fetch first",
    "stale info",
];

impl Repository {
    fn git(&self, args: &[&str]) -> Result<Output> {
        let workdir = self.workdir().ok_or(Error::BareRepository)?;
        debug!(?args, "running git");
        Ok(Command::new("git").args(args).current_dir(workdir).output()?)
    }

    /// Forcibly abort a half-finished merge, cherry-pick, revert or rebase.
    ///
    /// Returns the operation that was aborted, if any.
    ///
    /// # Errors
    /// Returns `AbortFailed` if git refuses to abort.
    pub fn abort_in_progress(&self) -> Result<Option<InProgressOp>> {
        let Some(op) = self.in_progress_operation() else {
            return Ok(None);
        };

        let args: &[&str] = match op {
            InProgressOp::Merge => &["merge", "--abort"],
            InProgressOp::CherryPick => &["cherry-pick", "--abort"],
            InProgressOp::Revert => &["revert", "--abort"],
            InProgressOp::Rebase => &["rebase", "--abort"],
        };

        let output = self.git(args)?;
        if output.status.success() {
            // A single-commit pick leaves no sequencer state for git to clean
            self.inner.cleanup_state()?;
            debug!(%op, "aborted in-progress operation");
            return Ok(Some(op));
        }

        // Picks started through libgit2 have no sequencer directory; fall back
        // to discarding them directly.
        if op == InProgressOp::CherryPick {
            warn!("git cherry-pick --abort failed, discarding pick directly");
            self.cherry_pick_abort()?;
            return Ok(Some(op));
        }

        Err(Error::AbortFailed {
            op: op.to_string(),
            message: stderr_of(&output),
        })
    }

    /// Stash tracked and untracked changes under `label`.
    ///
    /// # Errors
    /// Returns `StashFailed` if git refuses to stash.
    pub fn stash_push(&self, label: &str) -> Result<Option<StashHandle>> {
        if self.is_clean()? {
            return Ok(None);
        }

        let output = self.git(&["stash", "push", "--include-untracked", "-m", label])?;
        if !output.status.success() {
            return Err(Error::StashFailed(stderr_of(&output)));
        }

        let id = self
            .inner
            .refname_to_id("refs/stash")
            .map_err(|_| Error::StashFailed("no stash entry was created".into()))?;
        debug!(%id, label, "stashed working copy");

        Ok(Some(StashHandle {
            id,
            label: label.to_string(),
        }))
    }

    /// Pop the stash entry identified by `handle`.
    ///
    /// # Errors
    /// Returns `StashFailed` if the pop fails without leaving conflicts.
    pub fn stash_pop(&self, handle: &StashHandle) -> Result<StashPop> {
        let Some(position) = self.stash_position(handle)? else {
            warn!(id = %handle.id, label = %handle.label, "stash entry not found");
            return Ok(StashPop::NotFound);
        };

        let selector = format!("stash@{{{position}}}");
        let output = self.git(&["stash", "pop", &selector])?;
        if output.status.success() {
            debug!(%selector, "restored stash");
            return Ok(StashPop::Restored);
        }

        let conflicts = self.conflicting_files()?;
        if conflicts.is_empty() {
            return Err(Error::StashFailed(stderr_of(&output)));
        }

        warn!(?conflicts, "stash pop produced conflicts");
        Ok(StashPop::Conflicted(conflicts))
    }

    fn stash_position(&self, handle: &StashHandle) -> Result<Option<usize>> {
        let Ok(reflog) = self.inner.reflog("refs/stash") else {
            return Ok(None);
        };

        Ok(reflog.iter().position(|entry| entry.id_new() == handle.id))
    }

    /// Push a local branch to the same name on `remote`.
    ///
    /// # Errors
    /// Returns `PushFailed` for failures other than a remote rejection.
    pub fn push(&self, remote: &str, branch: &str) -> Result<PushOutcome> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let output = self.git(&["push", "--porcelain", remote, &refspec])?;
        if output.status.success() {
            debug!(remote, branch, "pushed");
            return Ok(PushOutcome::Pushed);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = stderr_of(&output);
        if REJECTION_MARKERS
            .iter()
            .any(|m| stdout.contains(m) || stderr.contains(m))
        {
            warn!(remote, branch, "push rejected by remote");
            return Ok(PushOutcome::Rejected(stderr));
        }

        Err(Error::PushFailed(stderr))
    }
}

fn stderr_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    }
}
