//! Terminal answers to the decisions a transfer needs.

use std::fmt;

use colored::Colorize;
use ferry_core::{ConflictChoice, MigrationPrompt, ReconcilePrompt, StashPrompt};
use ferry_git::CommitMetadata;
use inquire::{Confirm, Select};
use tracing::debug;

use crate::output;

/// Asks the operator on the terminal.
///
/// A cancelled prompt or a missing terminal counts as "no", and as abort
/// for conflicts.
#[derive(Debug, Clone, Copy)]
pub struct InteractiveOperator {
    /// Accept stash and rewrite confirmations without asking.
    assume_yes: bool,
}

impl InteractiveOperator {
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    /// Ask before the work branch is reset from its reflog.
    pub fn confirm_restore(&self, work: &str) -> bool {
        self.confirm(
            &format!("This resets {work} to its last state before it was reset onto base. Continue?"),
            false,
        )
    }

    fn confirm(&self, message: &str, default: bool) -> bool {
        if self.assume_yes {
            return true;
        }
        ask(message, default)
    }
}

fn ask(message: &str, default: bool) -> bool {
    if !console::user_attended() {
        debug!(message, "no terminal, answering no");
        return false;
    }
    Confirm::new(message)
        .with_default(default)
        .prompt()
        .unwrap_or(false)
}

/// Conflict choices in the order they are offered.
const CONFLICT_OPTIONS: [ConflictChoice; 4] = [
    ConflictChoice::Ours,
    ConflictChoice::Theirs,
    ConflictChoice::Skip,
    ConflictChoice::Abort,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConflictOption(ConflictChoice);

impl fmt::Display for ConflictOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self.0 {
            ConflictChoice::Ours => "ours    keep the base version of every conflicted file",
            ConflictChoice::Theirs => "theirs  take this commit's version of every conflicted file",
            ConflictChoice::Skip => "skip    drop this commit and continue",
            ConflictChoice::Abort => "abort   stop here and resolve by hand",
        };
        f.write_str(text)
    }
}

impl MigrationPrompt for InteractiveOperator {
    fn decide_conflict(&self, commit: &CommitMetadata, files: &[String]) -> ConflictChoice {
        output::warn(&format!(
            "Conflict replaying {} {}",
            ferry_git::short_id(commit.id).yellow(),
            commit.summary()
        ));
        for file in files {
            eprintln!("  → {file}");
        }

        if !console::user_attended() {
            return ConflictChoice::Abort;
        }

        let options = CONFLICT_OPTIONS.map(ConflictOption).to_vec();
        Select::new("How should the conflict be resolved?", options)
            .with_help_message("Resolution applies to every conflicted file in this commit")
            .prompt()
            .map_or(ConflictChoice::Abort, |option| option.0)
    }

    fn confirm_commit(&self, commit: &CommitMetadata, position: usize, total: usize) -> bool {
        // Step mode always asks, even with --yes.
        ask(
            &format!(
                "[{position}/{total}] Replay {} {}?",
                ferry_git::short_id(commit.id),
                commit.summary()
            ),
            true,
        )
    }
}

impl ReconcilePrompt for InteractiveOperator {
    fn confirm_rewrite(&self, work: &str, remaining: usize) -> bool {
        self.confirm(
            &format!("Rewrite {work} on top of the new base, keeping {remaining} pending commit(s)?"),
            true,
        )
    }
}

impl StashPrompt for InteractiveOperator {
    fn confirm_stash(&self, branch: Option<&str>) -> bool {
        let on = branch.map(|b| format!(" on {b}")).unwrap_or_default();
        self.confirm(
            &format!("Uncommitted changes{on}. Stash them for the duration of the transfer?"),
            true,
        )
    }
}
