//! `ferry switch` and `ferry park` commands - Move between work and base.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ferry_core::{Config, RepoStatus, Switched};
use ferry_git::Repository;

use super::utils::Workspace;
use crate::output;

/// Run the switch command.
pub fn run(root: Option<&Path>, query: &str) -> Result<()> {
    let workspace = Workspace::load(root)?;
    let (status, repo) = workspace.open(query)?;
    execute(&workspace.config, &status, &repo)
}

/// Toggle branches in an open repository.
pub fn execute(config: &Config, status: &RepoStatus, repo: &Repository) -> Result<()> {
    let switched = ferry_core::switch_branch(repo, config)
        .with_context(|| format!("Cannot switch branches in {}", status.name))?;
    report(&status.name, &switched);
    Ok(())
}

/// Run the park command.
pub fn run_park(root: Option<&Path>) -> Result<()> {
    park(&Workspace::load(root)?)
}

/// Put every repository under the workspace root on its work branch.
pub fn park(workspace: &Workspace) -> Result<()> {
    let paths: Vec<PathBuf> = ferry_core::discover_repos(&workspace.root)
        .with_context(|| format!("Cannot scan {}", workspace.root.display()))?;

    let mut failed = 0;
    for parked in ferry_core::park_all(&paths, &workspace.config) {
        let name = parked
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match parked.result {
            Ok(switched) => report(&name, &switched),
            Err(e) => {
                failed += 1;
                output::warn(&format!("{name}: {e}"));
            }
        }
    }

    if failed > 0 {
        bail!("{failed} repositor{} could not be parked", if failed == 1 { "y" } else { "ies" });
    }
    Ok(())
}

fn report(name: &str, switched: &Switched) {
    match switched {
        Switched::AlreadyOn(branch) => output::info(&format!("{name}: already on {branch}")),
        Switched::CheckedOut(branch) => output::success(&format!("{name}: switched to {branch}")),
        Switched::Created { branch, from } => {
            output::success(&format!("{name}: created {branch} from {from}"));
        }
    }
}
