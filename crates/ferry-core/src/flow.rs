//! The full transfer: guard, migrate, validate, push, reconcile, restore.

use chrono::Local;
use ferry_git::GitOps;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::guard::{ChangeGuard, RestoreReport};
use crate::migrate::{MigrationEngine, MigrationOutcome, RunStatus};
use crate::prompt::{MigrationPrompt, ReconcilePrompt, StashPrompt};
use crate::queue::PendingQueue;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::resolver::BaseResolver;
use crate::validate::PushValidator;

/// Everything one transfer did.
///
/// Once the guard has opened, failures are recorded here instead of being
/// returned, so the operator always learns what was changed and how the
/// working copy was left.
#[derive(Debug)]
pub struct TransferReport {
    pub base: String,
    pub migration: Option<MigrationOutcome>,
    pub pushed: bool,
    pub reconcile: Option<ReconcileOutcome>,
    /// The step that stopped the transfer, if one failed.
    pub failure: Option<Error>,
    pub restore: RestoreReport,
}

impl TransferReport {
    /// Commits moved, validated and pushed, with nothing left to fix.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
            && self.pushed
            && !self.restore.needs_attention()
            && self.migration.as_ref().is_some_and(MigrationOutcome::is_success)
    }
}

/// Options for one transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferOptions {
    /// How many pending commits to move, oldest first.
    pub count: usize,
    /// Confirm each commit before replaying it.
    pub step_mode: bool,
}

/// Move the oldest `options.count` pending commits to base and push them.
///
/// # Errors
/// Returns error only for problems found before anything is changed:
/// missing identity, missing base, an invalid count, or a declined stash.
pub fn run_transfer<G, P>(
    repo: &G,
    config: &Config,
    options: TransferOptions,
    prompt: &P,
) -> Result<TransferReport>
where
    G: GitOps,
    P: MigrationPrompt + ReconcilePrompt + StashPrompt,
{
    let identity = repo.local_identity()?;
    let base = BaseResolver::from_config(config).ensure_exists(repo)?.name;
    let work = config.branches.work.as_str();

    let pending = PendingQueue::compute(repo, &base, work)?.len();
    if options.count == 0 || options.count > pending {
        return Err(Error::InvalidSelection {
            requested: options.count,
            available: pending,
        });
    }

    let guard = ChangeGuard::open(repo, &config.stash.label_prefix, prompt)?;
    let captured_at = Local::now().fixed_offset();

    let mut report = TransferReport {
        base: base.clone(),
        migration: None,
        pushed: false,
        reconcile: None,
        failure: None,
        restore: RestoreReport::NothingToRestore,
    };

    let engine = MigrationEngine::new(repo, prompt).with_step_mode(options.step_mode);
    match engine.run_at(&base, work, options.count, captured_at) {
        Ok(outcome) => report.migration = Some(outcome),
        Err(err) => report.failure = Some(err),
    }

    if let Some(outcome) = report.migration.as_ref() {
        match &outcome.status {
            RunStatus::Success => {
                let validator = PushValidator::new(repo, &config.remote.name);
                match validator.validate_and_push(&base, &outcome.moved(), &captured_at, &identity)
                {
                    Ok(()) => report.pushed = true,
                    Err(err) => report.failure = Some(err),
                }
            }
            RunStatus::Failed { commit, reason } => {
                report.failure = Some(Error::ReplayFailed {
                    commit: ferry_git::short_id(*commit),
                    message: reason.clone(),
                });
            }
            RunStatus::NothingApplied => info!(base = %base, "nothing new on base, skipping push"),
            RunStatus::Aborted { commit, .. } => {
                warn!(commit = %commit, "transfer stopped on conflict");
            }
        }
    }

    if report.pushed {
        let consumed = report
            .migration
            .as_ref()
            .map(MigrationOutcome::consumed)
            .unwrap_or_default();
        let reconciler =
            Reconciler::new(repo, prompt).with_backup(config.migrate.backup_before_rewrite);
        match reconciler.reconcile(&base, work, &consumed, &captured_at) {
            Ok(outcome) => report.reconcile = Some(outcome),
            Err(err) => report.failure = Some(err),
        }
    }

    report.restore = guard.close();
    if report.failure.is_none() {
        report.failure = match &report.restore {
            RestoreReport::Conflicted(files) => Some(Error::StashRestoreFailed(format!(
                "conflicts in {}",
                files.join(", ")
            ))),
            RestoreReport::StashMissing => Some(Error::StashRestoreFailed(
                "the stash entry ferry created is gone".into(),
            )),
            _ => None,
        };
    }

    info!(base = %base, pushed = report.pushed, failed = report.failure.is_some(), "transfer finished");
    Ok(report)
}
