//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use ferry_core::{CommitStatus, RestoreReport};

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
///
/// Use for indented detail lines that accompany info or warn messages.
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(60).dimmed());
    }
}

/// Pending count, highlighted when there is something to move.
#[must_use]
pub fn pending_count(count: usize) -> String {
    if count == 0 {
        "0".dimmed().to_string()
    } else {
        count.to_string().yellow().bold().to_string()
    }
}

/// Branch name, marked when it is the work branch.
#[must_use]
pub fn branch_name(name: &str, is_work: bool) -> String {
    if is_work {
        format!("{} {}", "▶".cyan(), name.cyan().bold())
    } else {
        format!("  {name}")
    }
}

/// Glyph for what happened to one replayed commit.
#[must_use]
pub fn status_indicator(status: &CommitStatus) -> String {
    match status {
        CommitStatus::Applied => "●".green().to_string(),
        CommitStatus::Resolved(_) => "●".yellow().to_string(),
        CommitStatus::EmptySkipped => "○".dimmed().to_string(),
        CommitStatus::Skipped => "○".red().to_string(),
    }
}

/// Tell the operator how the working copy was left.
pub fn restore_report(report: &RestoreReport) {
    match report {
        RestoreReport::NothingToRestore => {}
        RestoreReport::Restored => success("Uncommitted changes restored"),
        RestoreReport::Conflicted(files) => {
            warn("Restoring uncommitted changes conflicted; the stash entry was kept:");
            for file in files {
                eprintln!("  → {file}");
            }
            eprintln!("  Resolve the files, then drop the entry with `git stash drop`.");
        }
        RestoreReport::StashMissing => {
            warn("The stash entry holding your uncommitted changes could not be found.");
            eprintln!("  Check `git stash list` before doing anything else.");
        }
        RestoreReport::LeftInPlace(reason) => {
            warn(&format!("Working copy left as is: {reason}"));
            eprintln!("  Your uncommitted changes are still in `git stash list`.");
        }
    }
}
