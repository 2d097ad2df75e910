//! `ferry preview` command - List the pending commits of one repository.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use ferry_core::{BaseResolver, Config, PendingQueue, QueueEntry, RepoStatus};
use ferry_git::Repository;
use serde::Serialize;

use super::utils::Workspace;
use crate::output;

/// Run the preview command.
pub fn run(root: Option<&Path>, query: &str, json: bool) -> Result<()> {
    let workspace = Workspace::load(root)?;
    let (status, repo) = workspace.open(query)?;
    execute(&workspace.config, &status, &repo, json)
}

/// Preview the queue of an open repository.
pub fn execute(config: &Config, status: &RepoStatus, repo: &Repository, json: bool) -> Result<()> {
    let work = &config.branches.work;
    let base = BaseResolver::from_config(config).resolve(repo);
    let queue = PendingQueue::compute(repo, &base, work).context("Failed to compute queue")?;
    let entries = queue.preview(repo).context("Failed to read pending commits")?;

    if json {
        let output = JsonOutput {
            repository: &status.name,
            base: &base,
            work,
            commits: &entries,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if entries.is_empty() {
        output::info(&format!("{}: nothing pending on {work}", status.name));
        return Ok(());
    }

    print_entries(&status.name, &base, work, &entries);
    Ok(())
}

/// Print the queue, oldest first, numbered as `migrate -n` counts them.
pub fn print_entries(name: &str, base: &str, work: &str, entries: &[QueueEntry]) {
    println!();
    println!(
        "  {} {} → {}",
        name.bold(),
        work.cyan(),
        base.dimmed()
    );
    output::hr();
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "  {:>3}. {} {} {}",
            i + 1,
            entry.short_id.yellow(),
            entry.date.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            entry.summary
        );
    }
    output::hr();
    println!();
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    repository: &'a str,
    base: &'a str,
    work: &'a str,
    commits: &'a [QueueEntry],
}
