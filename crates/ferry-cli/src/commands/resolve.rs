//! `ferry resolve` command - Show the base branch, creating it if missing.

use std::path::Path;

use anyhow::{Context, Result};
use ferry_core::{BaseResolver, Config, RepoStatus};
use ferry_git::Repository;

use super::utils::Workspace;
use crate::output;

/// Run the resolve command.
pub fn run(root: Option<&Path>, query: &str) -> Result<()> {
    let workspace = Workspace::load(root)?;
    let (status, repo) = workspace.open(query)?;
    execute(&workspace.config, &status, &repo)
}

/// Resolve the base of an open repository.
pub fn execute(config: &Config, status: &RepoStatus, repo: &Repository) -> Result<()> {
    let base = BaseResolver::from_config(config)
        .ensure_exists(repo)
        .with_context(|| format!("Cannot resolve the base branch of {}", status.name))?;

    if let Some(from) = &base.created_from {
        output::success(&format!("Created base branch '{}' from {from}", base.name));
    }
    output::essential(&base.name);
    Ok(())
}
