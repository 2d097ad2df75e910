//! Migration engine.
//!
//! Replays the oldest `n` pending commits onto the base branch, one at a
//! time, rewriting author and committer dates to a single timestamp captured
//! when the run starts. Content and messages are never changed.
//!
//! Per commit the engine moves through:
//!
//! ```text
//! PENDING -> REPLAYING -> APPLIED
//!                      -> EMPTY_SKIPPED
//!                      -> CONFLICT -> ours | theirs -> APPLIED | EMPTY_SKIPPED
//!                                  -> skip          -> SKIPPED
//!                                  -> abort         (run stops, conflict left in place)
//! ```
//!
//! The engine never pushes and never touches the work branch.

use chrono::{DateTime, FixedOffset, Local};
use ferry_git::{CommitMetadata, ConflictSide, GitOps, Oid, PickOutcome};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::prompt::{ConflictChoice, MigrationPrompt};
use crate::queue::PendingQueue;

/// What happened to one replayed commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// Applied cleanly.
    Applied,
    /// Base already had the change; no commit was created.
    EmptySkipped,
    /// Conflicted and resolved to one side.
    Resolved(ConflictSide),
    /// Conflicted and dropped by the operator.
    Skipped,
}

impl std::fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::EmptySkipped => write!(f, "already on base"),
            Self::Resolved(side) => write!(f, "resolved ({side})"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result for one commit of the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    /// The pending commit that was replayed.
    pub source: Oid,
    pub summary: String,
    pub status: CommitStatus,
    /// The commit now on the target branch, if one was created.
    pub new_id: Option<Oid>,
}

/// Overall result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every selected commit was handled and at least one landed on base.
    Success,
    /// Every handled commit was empty or skipped; base did not move.
    NothingApplied,
    /// The operator aborted on a conflict. The repository is still
    /// mid-cherry-pick on base.
    Aborted { commit: Oid, files: Vec<String> },
    /// Replay failed for a reason other than a conflict. The in-progress
    /// pick was discarded.
    Failed { commit: Oid, reason: String },
}

/// Everything a run did, in queue order.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub base: String,
    pub captured_at: DateTime<FixedOffset>,
    pub requested: usize,
    pub results: Vec<CommitResult>,
    pub status: RunStatus,
    /// Step mode stopped the run before all requested commits were handled.
    pub stopped_early: bool,
}

impl MigrationOutcome {
    /// Whether base moved and the result may be validated and pushed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Commits created on base by this run.
    #[must_use]
    pub fn moved(&self) -> Vec<Oid> {
        self.results.iter().filter_map(|r| r.new_id).collect()
    }

    /// Pending commits this run dealt with, whether or not they produced a
    /// commit on base.
    #[must_use]
    pub fn consumed(&self) -> Vec<Oid> {
        self.results.iter().map(|r| r.source).collect()
    }
}

/// Whether a replayed commit gets new timestamps.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Retime<'t> {
    /// Rewrite author and committer dates and reset the author.
    To(&'t DateTime<FixedOffset>),
    /// Keep the original author and author date.
    Keep,
}

/// How replaying a single commit ended.
#[derive(Debug)]
pub(crate) enum Replayed {
    Done(CommitResult),
    Aborted(Vec<String>),
    Failed(String),
}

/// Replay one commit onto HEAD, asking the operator about conflicts.
pub(crate) fn replay_commit<G, P>(repo: &G, prompt: &P, id: Oid, retime: Retime<'_>) -> Replayed
where
    G: GitOps,
    P: MigrationPrompt + ?Sized,
{
    match try_replay(repo, prompt, id, retime) {
        Ok(replayed) => replayed,
        Err(err) => {
            if repo.in_progress_operation().is_some() {
                if let Err(abort_err) = repo.cherry_pick_abort() {
                    warn!(commit = %id, error = %abort_err, "could not discard failed replay");
                }
            }
            warn!(commit = %id, error = %err, "replay failed");
            Replayed::Failed(err.to_string())
        }
    }
}

fn try_replay<G, P>(
    repo: &G,
    prompt: &P,
    id: Oid,
    retime: Retime<'_>,
) -> ferry_git::Result<Replayed>
where
    G: GitOps,
    P: MigrationPrompt + ?Sized,
{
    let meta = repo.read_commit_metadata(id)?;
    debug!(commit = %id, summary = meta.summary(), "replaying");

    let (outcome, resolved) = match repo.cherry_pick(id)? {
        PickOutcome::Conflict(files) => match prompt.decide_conflict(&meta, &files) {
            ConflictChoice::Abort => {
                info!(commit = %id, ?files, "migration aborted on conflict");
                return Ok(Replayed::Aborted(files));
            }
            ConflictChoice::Skip => {
                repo.cherry_pick_skip()?;
                info!(commit = %id, "skipped conflicting commit");
                return Ok(Replayed::Done(result(&meta, CommitStatus::Skipped, None)));
            }
            ConflictChoice::Ours => resolve_to(repo, ConflictSide::Ours)?,
            ConflictChoice::Theirs => resolve_to(repo, ConflictSide::Theirs)?,
        },
        other => (other, None),
    };

    let done = match outcome {
        PickOutcome::Applied(new_id) => {
            let new_id = match retime {
                Retime::To(at) => repo.amend_current(at, at, true)?,
                Retime::Keep => new_id,
            };
            let status = resolved.map_or(CommitStatus::Applied, CommitStatus::Resolved);
            result(&meta, status, Some(new_id))
        }
        PickOutcome::Empty => result(&meta, CommitStatus::EmptySkipped, None),
        PickOutcome::Conflict(files) => {
            return Err(ferry_git::Error::UnresolvedConflicts(files));
        }
    };

    debug!(commit = %id, status = %done.status, "replayed");
    Ok(Replayed::Done(done))
}

fn resolve_to<G: GitOps>(
    repo: &G,
    side: ConflictSide,
) -> ferry_git::Result<(PickOutcome, Option<ConflictSide>)> {
    repo.resolve_conflicts(side)?;
    Ok((repo.cherry_pick_continue()?, Some(side)))
}

fn result(meta: &CommitMetadata, status: CommitStatus, new_id: Option<Oid>) -> CommitResult {
    CommitResult {
        source: meta.id,
        summary: meta.summary().to_string(),
        status,
        new_id,
    }
}

/// Replays pending commits onto base.
pub struct MigrationEngine<'a, G: GitOps, P: MigrationPrompt> {
    repo: &'a G,
    prompt: &'a P,
    step_mode: bool,
}

impl<'a, G: GitOps, P: MigrationPrompt> MigrationEngine<'a, G, P> {
    /// Create an engine over `repo`, asking `prompt` for decisions.
    #[must_use]
    pub const fn new(repo: &'a G, prompt: &'a P) -> Self {
        Self {
            repo,
            prompt,
            step_mode: false,
        }
    }

    /// Confirm every commit before it is replayed (only when moving more than one).
    #[must_use]
    pub const fn with_step_mode(mut self, step_mode: bool) -> Self {
        self.step_mode = step_mode;
        self
    }

    /// Move the oldest `n` pending commits, stamped with the current time.
    ///
    /// # Errors
    /// See [`MigrationEngine::run_at`].
    pub fn run(&self, base: &str, work: &str, n: usize) -> Result<MigrationOutcome> {
        self.run_at(base, work, n, Local::now().fixed_offset())
    }

    /// Move the oldest `n` pending commits, stamped with `captured_at`.
    ///
    /// Replay problems after the first mutation are reported through
    /// [`MigrationOutcome::status`], not as errors.
    ///
    /// # Errors
    /// - `DirtyWorkingCopy` if the working copy has changes
    /// - `MissingIdentity` if `user.name`/`user.email` are unset
    /// - `InvalidSelection` unless `1 <= n <= pending`
    /// - git errors while reading the queue or checking out base
    pub fn run_at(
        &self,
        base: &str,
        work: &str,
        n: usize,
        captured_at: DateTime<FixedOffset>,
    ) -> Result<MigrationOutcome> {
        if !self.repo.is_clean()? {
            return Err(Error::DirtyWorkingCopy);
        }
        self.repo.local_identity()?;

        let queue = PendingQueue::compute(self.repo, base, work)?;
        if n == 0 || n > queue.len() {
            return Err(Error::InvalidSelection {
                requested: n,
                available: queue.len(),
            });
        }

        info!(base, work, n, pending = queue.len(), at = %captured_at, "starting migration");
        self.repo.checkout(base)?;

        let selected = queue.prefix(n);
        let mut results = Vec::with_capacity(n);
        let mut halted = None;
        let mut stopped_early = false;

        for (position, &id) in selected.iter().enumerate() {
            if self.step_mode && n > 1 {
                match self.repo.read_commit_metadata(id) {
                    Ok(meta) => {
                        if !self.prompt.confirm_commit(&meta, position + 1, n) {
                            info!(commit = %id, "step mode stopped the run");
                            stopped_early = true;
                            break;
                        }
                    }
                    Err(err) => {
                        halted = Some(RunStatus::Failed {
                            commit: id,
                            reason: err.to_string(),
                        });
                        break;
                    }
                }
            }

            match replay_commit(self.repo, self.prompt, id, Retime::To(&captured_at)) {
                Replayed::Done(done) => results.push(done),
                Replayed::Aborted(files) => {
                    halted = Some(RunStatus::Aborted { commit: id, files });
                    break;
                }
                Replayed::Failed(reason) => {
                    halted = Some(RunStatus::Failed { commit: id, reason });
                    break;
                }
            }
        }

        let status = halted.unwrap_or_else(|| {
            if results.iter().any(|r| r.new_id.is_some()) {
                RunStatus::Success
            } else {
                RunStatus::NothingApplied
            }
        });
        info!(base, handled = results.len(), ?status, "migration finished");

        Ok(MigrationOutcome {
            base: base.to_string(),
            captured_at,
            requested: n,
            results,
            status,
            stopped_early,
        })
    }
}
