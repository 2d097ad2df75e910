//! `ferry restore` command - Recover the work branch from its reflog.

use std::path::Path;

use anyhow::{Context, Result};
use ferry_core::{Config, RepoStatus};
use ferry_git::Repository;

use super::utils::Workspace;
use crate::operator::InteractiveOperator;
use crate::output;

/// Run the restore command.
pub fn run(root: Option<&Path>, query: &str, yes: bool) -> Result<()> {
    let workspace = Workspace::load(root)?;
    let (status, repo) = workspace.open(query)?;
    execute(&workspace.config, &status, &repo, InteractiveOperator::new(yes))
}

/// Restore the work branch of an open repository once the operator agrees.
pub fn execute(
    config: &Config,
    status: &RepoStatus,
    repo: &Repository,
    operator: InteractiveOperator,
) -> Result<()> {
    let work = &config.branches.work;
    if !operator.confirm_restore(work) {
        output::info(&format!("{}: {work} left unchanged", status.name));
        return Ok(());
    }

    let restored = ferry_core::restore_work_branch(repo, config)
        .with_context(|| format!("Cannot restore {work} in {}", status.name))?;

    output::success(&format!(
        "Restored {work} to {} ({})",
        ferry_git::short_id(restored.commit),
        restored.message
    ));
    output::info(&format!(
        "{} commit(s) pending against {}",
        restored.pending, restored.base
    ));
    Ok(())
}
