//! Work-branch reconciliation after a successful push.
//!
//! Once base carries the moved commits, the work branch either still holds
//! unmoved commits (rewrite it onto the new base tip, keeping their dates) or
//! holds nothing new (hard reset it to base).

use chrono::{DateTime, FixedOffset};
use ferry_git::{GitOps, Oid, RefScope};
use tracing::{info, warn};

use crate::error::Result;
use crate::migrate::{CommitResult, Replayed, Retime, replay_commit};
use crate::prompt::{MigrationPrompt, ReconcilePrompt};
use crate::queue::PendingQueue;

/// What reconciliation did to the work branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The work branch does not exist; nothing to do.
    WorkMissing,
    /// No commits were left; work now points at the base tip.
    ResetToBase { tip: Oid },
    /// Work was rebuilt from the base tip with the remaining commits.
    Rewritten {
        backup: Option<String>,
        replayed: Vec<CommitResult>,
        tip: Oid,
    },
    /// The operator kept the work branch as it was.
    Declined { remaining: usize },
    /// The operator aborted on a conflict; work is mid-cherry-pick.
    Aborted {
        backup: Option<String>,
        commit: Oid,
        files: Vec<String>,
    },
    /// Replaying a remaining commit failed; work holds what was replayed so far.
    Failed {
        backup: Option<String>,
        commit: Oid,
        reason: String,
    },
}

impl ReconcileOutcome {
    /// Backup branch holding the old work tip, if one was made.
    #[must_use]
    pub fn backup(&self) -> Option<&str> {
        match self {
            Self::Rewritten { backup, .. }
            | Self::Aborted { backup, .. }
            | Self::Failed { backup, .. } => backup.as_deref(),
            _ => None,
        }
    }
}

/// Brings the work branch up to date with base.
pub struct Reconciler<'a, G: GitOps, P: MigrationPrompt + ReconcilePrompt> {
    repo: &'a G,
    prompt: &'a P,
    backup: bool,
}

impl<'a, G: GitOps, P: MigrationPrompt + ReconcilePrompt> Reconciler<'a, G, P> {
    #[must_use]
    pub const fn new(repo: &'a G, prompt: &'a P) -> Self {
        Self {
            repo,
            prompt,
            backup: true,
        }
    }

    /// Keep a backup branch of work before rewriting it.
    #[must_use]
    pub const fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Reconcile `work` after the commits in `consumed` were moved to `base`.
    ///
    /// `stamp` names the backup branch.
    ///
    /// # Errors
    /// Returns error if the queue cannot be recomputed or a branch cannot be
    /// reset or checked out.
    pub fn reconcile(
        &self,
        base: &str,
        work: &str,
        consumed: &[Oid],
        stamp: &DateTime<FixedOffset>,
    ) -> Result<ReconcileOutcome> {
        if !self.repo.ref_exists(work, RefScope::Local) {
            return Ok(ReconcileOutcome::WorkMissing);
        }

        let fresh = PendingQueue::compute(self.repo, base, work)?;
        let remaining: Vec<Oid> = fresh
            .commits
            .into_iter()
            .filter(|id| !consumed.contains(id))
            .collect();
        let base_tip = self.repo.branch_commit(base)?;

        if remaining.is_empty() {
            self.repo.reset_branch(work, base_tip)?;
            info!(work, base, tip = %base_tip, "work branch reset to base");
            return Ok(ReconcileOutcome::ResetToBase { tip: base_tip });
        }

        if !self.prompt.confirm_rewrite(work, remaining.len()) {
            info!(work, remaining = remaining.len(), "work branch left untouched");
            return Ok(ReconcileOutcome::Declined {
                remaining: remaining.len(),
            });
        }

        let backup = if self.backup {
            self.create_backup(work, stamp)
        } else {
            None
        };

        self.repo.reset_branch(work, base_tip)?;
        self.repo.checkout(work)?;

        let mut replayed = Vec::with_capacity(remaining.len());
        for id in remaining {
            match replay_commit(self.repo, self.prompt, id, Retime::Keep) {
                Replayed::Done(done) => replayed.push(done),
                Replayed::Aborted(files) => {
                    warn!(work, commit = %id, "rewrite of work branch aborted on conflict");
                    return Ok(ReconcileOutcome::Aborted {
                        backup,
                        commit: id,
                        files,
                    });
                }
                Replayed::Failed(reason) => {
                    return Ok(ReconcileOutcome::Failed {
                        backup,
                        commit: id,
                        reason,
                    });
                }
            }
        }

        let tip = self.repo.branch_commit(work)?;
        info!(work, replayed = replayed.len(), tip = %tip, "work branch rewritten");

        Ok(ReconcileOutcome::Rewritten {
            backup,
            replayed,
            tip,
        })
    }

    fn create_backup(&self, work: &str, stamp: &DateTime<FixedOffset>) -> Option<String> {
        let name = backup_branch_name(work, stamp);
        let tip = match self.repo.branch_commit(work) {
            Ok(tip) => tip,
            Err(err) => {
                warn!(work, error = %err, "could not read work tip for backup");
                return None;
            }
        };

        match self.repo.create_branch(&name, &tip.to_string()) {
            Ok(_) => {
                info!(backup = %name, tip = %tip, "backed up work branch");
                Some(name)
            }
            Err(err) => {
                warn!(backup = %name, error = %err, "could not create backup branch");
                None
            }
        }
    }
}

/// `backup_<work>_<YYYYmmddHHMMSS>`.
#[must_use]
pub fn backup_branch_name(work: &str, stamp: &DateTime<FixedOffset>) -> String {
    format!("backup_{work}_{}", stamp.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::CommitStatus;
    use crate::prompt::ConflictChoice;
    use crate::test_mocks::{MockGitOps, ScriptedPrompt, oid};
    use ferry_git::PickOutcome;

    fn stamp() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-17T08:05:09+00:00").unwrap()
    }

    #[test]
    fn test_backup_branch_name() {
        assert_eq!(
            backup_branch_name("local_commit", &stamp()),
            "backup_local_commit_20261017080509"
        );
    }

    #[test]
    fn test_everything_moved_resets_work_to_base() {
        let repo = MockGitOps::with_queue(&[oid(10), oid(11)]);
        let prompt = ScriptedPrompt::new();

        let outcome = Reconciler::new(&repo, &prompt)
            .reconcile("main", "local_commit", &[oid(10), oid(11)], &stamp())
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::ResetToBase { tip: oid(1) });
        assert_eq!(repo.branch_tip("local_commit"), Some(oid(1)));
        assert!(prompt.asked().is_empty());
    }

    #[test]
    fn test_remaining_commits_are_replayed_without_retiming() {
        let repo = MockGitOps::with_queue(&[oid(10), oid(11), oid(12)]);
        let prompt = ScriptedPrompt::new();

        let outcome = Reconciler::new(&repo, &prompt)
            .reconcile("main", "local_commit", &[oid(10), oid(11)], &stamp())
            .unwrap();

        let ReconcileOutcome::Rewritten {
            backup,
            replayed,
            tip,
        } = outcome
        else {
            panic!("expected rewrite, got {outcome:?}");
        };
        assert_eq!(backup.as_deref(), Some("backup_local_commit_20261017080509"));
        assert_eq!(repo.branch_tip("backup_local_commit_20261017080509"), Some(oid(2)));
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].source, oid(12));
        assert_eq!(replayed[0].status, CommitStatus::Applied);
        assert_eq!(repo.branch_tip("local_commit"), Some(tip));
        assert!(!repo.calls().iter().any(|c| c.starts_with("amend_current")));
        assert_eq!(prompt.asked(), vec!["rewrite local_commit 1".to_string()]);
    }

    #[test]
    fn test_declined_rewrite_leaves_work_untouched() {
        let repo = MockGitOps::with_queue(&[oid(10), oid(11)]);
        let prompt = ScriptedPrompt::new().declining_rewrite();

        let outcome = Reconciler::new(&repo, &prompt)
            .reconcile("main", "local_commit", &[oid(10)], &stamp())
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Declined { remaining: 1 });
        assert_eq!(repo.branch_tip("local_commit"), Some(oid(2)));
        assert!(!repo.calls().iter().any(|c| c.starts_with("reset_branch")));
    }

    #[test]
    fn test_backup_can_be_disabled() {
        let repo = MockGitOps::with_queue(&[oid(10), oid(11)]);
        let prompt = ScriptedPrompt::new();

        let outcome = Reconciler::new(&repo, &prompt)
            .with_backup(false)
            .reconcile("main", "local_commit", &[oid(10)], &stamp())
            .unwrap();

        assert_eq!(outcome.backup(), None);
        assert!(!repo.calls().iter().any(|c| c.starts_with("create_branch")));
    }

    #[test]
    fn test_conflict_abort_during_rewrite() {
        let repo = MockGitOps::with_queue(&[oid(10), oid(11)])
            .with_pick(oid(11), PickOutcome::Conflict(vec!["c.txt".into()]));
        let prompt = ScriptedPrompt::choosing(&[ConflictChoice::Abort]);

        let outcome = Reconciler::new(&repo, &prompt)
            .reconcile("main", "local_commit", &[oid(10)], &stamp())
            .unwrap();

        assert!(matches!(
            outcome,
            ReconcileOutcome::Aborted { commit, .. } if commit == oid(11)
        ));
        assert!(outcome.backup().is_some());
    }

    #[test]
    fn test_missing_work_branch() {
        let repo = MockGitOps::new().with_branch("main", oid(1));
        let prompt = ScriptedPrompt::new();

        let outcome = Reconciler::new(&repo, &prompt)
            .reconcile("main", "local_commit", &[], &stamp())
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::WorkMissing);
    }
}
