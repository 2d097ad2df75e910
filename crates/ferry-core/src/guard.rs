//! Uncommitted-change guard.
//!
//! Wraps an operation: stashes a dirty working copy on the way in, and on
//! the way out returns to the branch that was checked out and pops that
//! same stash. A stash is never dropped or resolved automatically.

use chrono::Local;
use ferry_git::{GitOps, Oid, StashHandle, StashPop};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::prompt::StashPrompt;

/// How the guard left the working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreReport {
    /// Nothing was stashed.
    NothingToRestore,
    /// The stash was popped cleanly.
    Restored,
    /// Popping produced conflicts; the stash entry is kept.
    Conflicted(Vec<String>),
    /// The stash entry could not be found.
    StashMissing,
    /// The guard did not switch back or pop, and says why.
    LeftInPlace(String),
}

impl RestoreReport {
    /// Whether the operator has to step in.
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(
            self,
            Self::Conflicted(_) | Self::StashMissing | Self::LeftInPlace(_)
        )
    }
}

/// Where HEAD was when the guard opened.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Branch(String),
    Detached(Oid),
    Unborn,
}

/// Saved state of one guarded operation.
pub struct ChangeGuard<'a, G: GitOps> {
    repo: &'a G,
    origin: Origin,
    stash: Option<StashHandle>,
}

impl<G: GitOps> std::fmt::Debug for ChangeGuard<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeGuard")
            .field("origin", &self.origin)
            .field("stash", &self.stash)
            .finish_non_exhaustive()
    }
}

impl<'a, G: GitOps> ChangeGuard<'a, G> {
    /// Record the current branch and stash uncommitted changes if there are any.
    ///
    /// A half-finished merge, cherry-pick or rebase is aborted first.
    ///
    /// # Errors
    /// Returns `DirtyWorkingCopy` if stashing is declined, or any git error
    /// while aborting or stashing.
    pub fn open<P: StashPrompt + ?Sized>(
        repo: &'a G,
        label_prefix: &str,
        consent: &P,
    ) -> Result<Self> {
        let origin = match repo.current_branch()? {
            Some(branch) => Origin::Branch(branch),
            None => repo.head_commit().map_or(Origin::Unborn, Origin::Detached),
        };

        let dirty = !repo.is_clean()? || repo.in_progress_operation().is_some();
        if !dirty {
            return Ok(Self {
                repo,
                origin,
                stash: None,
            });
        }

        let branch = match &origin {
            Origin::Branch(name) => Some(name.as_str()),
            _ => None,
        };
        if !consent.confirm_stash(branch) {
            return Err(Error::DirtyWorkingCopy);
        }

        if let Some(op) = repo.abort_in_progress()? {
            warn!(%op, "aborted a half-finished operation before stashing");
        }

        let label = format!(
            "{label_prefix} {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let stash = repo.stash_push(&label)?;
        if let Some(handle) = &stash {
            info!(label = %handle.label, id = %handle.id, "stashed uncommitted changes");
        }

        Ok(Self {
            repo,
            origin,
            stash,
        })
    }

    /// The stash this guard holds, if any.
    #[must_use]
    pub const fn stash(&self) -> Option<&StashHandle> {
        self.stash.as_ref()
    }

    /// Return to the original branch and pop the stash.
    ///
    /// Never fails: problems are reported in the returned [`RestoreReport`].
    /// If a cherry-pick or merge is still in progress the repository is left
    /// as it is so the operator can finish it.
    #[must_use]
    pub fn close(self) -> RestoreReport {
        let stash_note = self
            .stash
            .as_ref()
            .map(|h| format!("; your changes are in the stash '{}'", h.label))
            .unwrap_or_default();

        if let Some(op) = self.repo.in_progress_operation() {
            warn!(%op, "leaving repository mid-operation");
            return RestoreReport::LeftInPlace(format!(
                "a {op} is still in progress{stash_note}"
            ));
        }

        let target = match &self.origin {
            Origin::Branch(name) => Some(name.clone()),
            Origin::Detached(id) => Some(id.to_string()),
            Origin::Unborn => None,
        };
        if let Some(target) = target {
            let on_target = match &self.origin {
                Origin::Branch(name) => {
                    self.repo.current_branch().ok().flatten().as_deref() == Some(name.as_str())
                }
                _ => false,
            };
            if !on_target {
                if let Err(err) = self.repo.checkout(&target) {
                    warn!(%target, error = %err, "could not return to original branch");
                    return RestoreReport::LeftInPlace(format!(
                        "could not check out '{target}': {err}{stash_note}"
                    ));
                }
            }
        }

        let Some(handle) = self.stash else {
            return RestoreReport::NothingToRestore;
        };

        match self.repo.stash_pop(&handle) {
            Ok(StashPop::Restored) => {
                info!(label = %handle.label, "restored uncommitted changes");
                RestoreReport::Restored
            }
            Ok(StashPop::Conflicted(files)) => {
                warn!(label = %handle.label, ?files, "stash pop conflicted");
                RestoreReport::Conflicted(files)
            }
            Ok(StashPop::NotFound) => {
                warn!(label = %handle.label, "stash entry is gone");
                RestoreReport::StashMissing
            }
            Err(err) => {
                warn!(label = %handle.label, error = %err, "stash pop failed");
                RestoreReport::LeftInPlace(format!(
                    "could not pop stash '{}': {err}",
                    handle.label
                ))
            }
        }
    }
}
