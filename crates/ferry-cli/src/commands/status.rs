//! `ferry status` command - Display every managed repository.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use ferry_core::{Config, RepoStatus};
use serde::Serialize;

use super::utils::Workspace;
use crate::output;

/// Run the status command.
pub fn run(root: Option<&Path>, json: bool) -> Result<()> {
    let workspace = Workspace::load(root)?;
    let statuses = workspace.scan()?;

    if json {
        let output = JsonOutput {
            root: &workspace.root,
            work_branch: &workspace.config.branches.work,
            repositories: &statuses,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if statuses.is_empty() {
        output::info(&format!(
            "No git repositories under {}",
            workspace.root.display()
        ));
        return Ok(());
    }

    print_table(&statuses, &workspace.config);
    Ok(())
}

/// Print one row per repository.
pub fn print_table(statuses: &[RepoStatus], config: &Config) {
    let width = statuses
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(10);

    println!();
    println!(
        "  {:<width$}  {:<18} {:<8} {}",
        "Repository".bold(),
        "Branch".bold(),
        "Base".bold(),
        "Pending".bold()
    );
    output::hr();

    for status in statuses {
        let branch = output::branch_name(&status.branch, status.on_work_branch(config));
        let dirty = if status.clean {
            String::new()
        } else {
            format!(" {}", "(dirty)".yellow())
        };
        println!(
            "  {:<width$}{branch:<20} {:<8} {}{dirty}",
            status.name,
            status.base.dimmed(),
            output::pending_count(status.pending),
        );
    }

    output::hr();
    println!();
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    root: &'a Path,
    work_branch: &'a str,
    repositories: &'a [RepoStatus],
}
