//! # ferry-core
//!
//! Core logic for Ferry: base branch resolution, the pending queue, the
//! migration engine that replays work-branch commits onto base with a fresh
//! timestamp, pre-push validation, work-branch reconciliation and the
//! uncommitted-change guard around all of it.

pub mod config;
pub mod error;
pub mod flow;
pub mod guard;
pub mod migrate;
pub mod prompt;
pub mod queue;
pub mod reconcile;
pub mod resolver;
pub mod restore;
pub mod scan;
pub mod switch;
pub mod validate;

#[cfg(test)]
mod test_mocks;

pub use config::Config;
pub use error::{Error, Result};
pub use flow::{TransferOptions, TransferReport, run_transfer};
pub use guard::{ChangeGuard, RestoreReport};
pub use migrate::{CommitResult, CommitStatus, MigrationEngine, MigrationOutcome, RunStatus};
pub use prompt::{ConflictChoice, MigrationPrompt, ReconcilePrompt, StashPrompt, Unattended};
pub use queue::{PendingQueue, QueueEntry};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use resolver::{BaseBranch, BaseResolver};
pub use restore::{RestoredWork, restore_work_branch};
pub use scan::{RepoStatus, discover_repos, find_repo, inspect, scan};
pub use switch::{Parked, Switched, park_all, switch_branch, switch_to_base, switch_to_work};
pub use validate::{PushValidator, ValidationReport, Violation};
