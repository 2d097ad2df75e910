//! `ferry migrate` command - Move pending commits to base and push them.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use ferry_core::{
    BaseResolver, Config, MigrationOutcome, PendingQueue, ReconcileOutcome, RunStatus,
    TransferOptions, TransferReport,
};
use ferry_git::Repository;
use inquire::CustomType;

use super::preview::print_entries;
use super::utils::Workspace;
use crate::operator::InteractiveOperator;
use crate::output;

/// Run the migrate command.
pub fn run(
    root: Option<&Path>,
    query: &str,
    count: Option<usize>,
    step: bool,
    yes: bool,
) -> Result<()> {
    let workspace = Workspace::load(root)?;
    let (status, repo) = workspace.open(query)?;
    let step = step || workspace.config.migrate.step_mode;

    transfer(
        &repo,
        &status.name,
        &workspace.config,
        count,
        step,
        InteractiveOperator::new(yes),
    )
}

/// Transfer commits of one open repository, asking for the count when it
/// was not given.
pub fn transfer(
    repo: &Repository,
    name: &str,
    config: &Config,
    count: Option<usize>,
    step_mode: bool,
    operator: InteractiveOperator,
) -> Result<()> {
    let count = match count {
        Some(count) => count,
        None => match ask_count(repo, name, config)? {
            Some(count) => count,
            None => return Ok(()),
        },
    };

    let options = TransferOptions { count, step_mode };
    let report = ferry_core::run_transfer(repo, config, options, &operator)
        .with_context(|| format!("Cannot migrate {name}"))?;

    print_report(&report, config);

    if let Some(failure) = report.failure {
        return Err(anyhow::Error::new(failure).context(format!("Migration of {name} incomplete")));
    }
    if matches!(
        report.reconcile,
        Some(ReconcileOutcome::Aborted { .. } | ReconcileOutcome::Failed { .. })
    ) {
        bail!(
            "Base of {name} was pushed, but {} needs manual attention",
            config.branches.work
        );
    }
    if report.restore.needs_attention() {
        bail!("Migration of {name} needs manual attention");
    }
    Ok(())
}

/// Show the queue and ask how many commits to move. `None` when nothing
/// is pending.
fn ask_count(repo: &Repository, name: &str, config: &Config) -> Result<Option<usize>> {
    let work = &config.branches.work;
    let base = BaseResolver::from_config(config).resolve(repo);
    let queue = PendingQueue::compute(repo, &base, work).context("Failed to compute queue")?;

    if queue.is_empty() {
        output::info(&format!("{name}: nothing pending on {work}"));
        return Ok(None);
    }
    if !console::user_attended() {
        bail!("{} commit(s) pending; pass -n to choose how many to move", queue.len());
    }

    print_entries(name, &base, work, &queue.preview(repo)?);

    let available = queue.len();
    let count = CustomType::<usize>::new("How many commits to move (oldest first)?")
        .with_default(available)
        .with_error_message("Enter a number")
        .with_validator(move |n: &usize| {
            if (1..=available).contains(n) {
                Ok(inquire::validator::Validation::Valid)
            } else {
                Ok(inquire::validator::Validation::Invalid(
                    format!("Choose between 1 and {available}").into(),
                ))
            }
        })
        .prompt()
        .context("Selection cancelled")?;

    Ok(Some(count))
}

fn print_report(report: &TransferReport, config: &Config) {
    if let Some(migration) = &report.migration {
        print_migration(migration);
    }

    if report.pushed {
        let moved = report.migration.as_ref().map_or(0, |m| m.moved().len());
        output::success(&format!(
            "Pushed {moved} commit(s) to {}/{}",
            config.remote.name, report.base
        ));
    }

    if let Some(outcome) = &report.reconcile {
        print_reconcile(outcome, &config.branches.work);
    }

    output::restore_report(&report.restore);
}

fn print_migration(migration: &MigrationOutcome) {
    output::hr();
    for result in &migration.results {
        output::detail(&format!(
            "  {} {} {} {}",
            output::status_indicator(&result.status),
            ferry_git::short_id(result.source).yellow(),
            result.summary,
            format!("({})", result.status).dimmed()
        ));
    }
    output::hr();

    if migration.stopped_early {
        output::info(&format!(
            "Stopped after {} of {} commit(s)",
            migration.results.len(),
            migration.requested
        ));
    }

    match &migration.status {
        RunStatus::Success => {}
        RunStatus::NothingApplied => {
            output::info(&format!("Nothing new landed on {}; nothing pushed", migration.base));
        }
        RunStatus::Aborted { commit, files } => {
            output::warn(&format!(
                "Stopped on a conflict in {}; {} is mid-cherry-pick:",
                ferry_git::short_id(*commit),
                migration.base
            ));
            for file in files {
                eprintln!("  → {file}");
            }
            eprintln!("  Resolve and `git cherry-pick --continue`, or `git cherry-pick --abort`.");
        }
        RunStatus::Failed { .. } => {}
    }
}

fn print_reconcile(outcome: &ReconcileOutcome, work: &str) {
    match outcome {
        ReconcileOutcome::WorkMissing => {}
        ReconcileOutcome::ResetToBase { tip } => {
            output::success(&format!(
                "Nothing left on {work}; reset it to {}",
                ferry_git::short_id(*tip)
            ));
        }
        ReconcileOutcome::Rewritten { replayed, .. } => {
            output::success(&format!(
                "Rewrote {work} with {} remaining commit(s)",
                replayed.len()
            ));
        }
        ReconcileOutcome::Declined { remaining } => {
            output::info(&format!(
                "{work} kept as is; its {remaining} pending commit(s) still include the moved ones"
            ));
        }
        ReconcileOutcome::Aborted { commit, files, .. } => {
            output::warn(&format!(
                "Rewriting {work} stopped on a conflict in {}:",
                ferry_git::short_id(*commit)
            ));
            for file in files {
                eprintln!("  → {file}");
            }
        }
        ReconcileOutcome::Failed { commit, reason, .. } => {
            output::warn(&format!(
                "Rewriting {work} failed at {}: {reason}",
                ferry_git::short_id(*commit)
            ));
        }
    }

    if let Some(backup) = outcome.backup() {
        output::info(&format!("Previous {work} saved as {backup}"));
    }
}
