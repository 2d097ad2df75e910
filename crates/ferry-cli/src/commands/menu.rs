//! `ferry menu` command - Pick a repository and an action interactively.
//!
//! Every pass rescans, so the counts shown are never older than the last
//! action.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use ferry_core::RepoStatus;
use inquire::Select;

use super::utils::{Workspace, open_repo};
use super::{migrate, preview, resolve, restore, status, switch};
use crate::operator::InteractiveOperator;
use crate::output;

enum Target {
    Repo(RepoStatus),
    ParkAll,
    Quit,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repo(status) => write!(
                f,
                "{:<24} {:<16} {} pending",
                status.name, status.branch, status.pending
            ),
            Self::ParkAll => f.write_str("⟲ Put every repository on its work branch"),
            Self::Quit => f.write_str("✗ Quit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Migrate,
    Preview,
    Switch,
    Resolve,
    Restore,
    Back,
}

impl Action {
    const ALL: [Self; 6] = [
        Self::Migrate,
        Self::Preview,
        Self::Switch,
        Self::Resolve,
        Self::Restore,
        Self::Back,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Migrate => "Migrate commits to base and push",
            Self::Preview => "Preview pending commits",
            Self::Switch => "Switch between work branch and base",
            Self::Resolve => "Resolve the base branch",
            Self::Restore => "Restore the work branch from its reflog",
            Self::Back => "Back",
        })
    }
}

/// Run the menu.
pub fn run(root: Option<&Path>) -> Result<()> {
    if !console::user_attended() {
        bail!("The menu needs a terminal; see `ferry --help` for the subcommands");
    }

    let workspace = Workspace::load(root)?;
    loop {
        let statuses = workspace.scan()?;
        status::print_table(&statuses, &workspace.config);

        let mut targets: Vec<Target> = statuses.into_iter().map(Target::Repo).collect();
        targets.push(Target::ParkAll);
        targets.push(Target::Quit);

        let Some(target) = Select::new("Repository:", targets)
            .with_page_size(15)
            .prompt_skippable()
            .context("Failed to read selection")?
        else {
            return Ok(());
        };

        let result = match target {
            Target::Quit => return Ok(()),
            Target::ParkAll => switch::park(&workspace),
            Target::Repo(status) => act(&workspace, &status),
        };

        // Errors end the action, not the menu.
        if let Err(e) = result {
            output::error(&format!("{e:#}"));
        }
    }
}

fn act(workspace: &Workspace, status: &RepoStatus) -> Result<()> {
    let Some(action) = Select::new(&format!("{}:", status.name), Action::ALL.to_vec())
        .prompt_skippable()
        .context("Failed to read selection")?
    else {
        return Ok(());
    };

    let config = &workspace.config;
    let repo = open_repo(&status.path)?;
    match action {
        Action::Migrate => migrate::transfer(
            &repo,
            &status.name,
            config,
            None,
            config.migrate.step_mode,
            InteractiveOperator::new(false),
        ),
        Action::Preview => preview::execute(config, status, &repo, false),
        Action::Switch => switch::execute(config, status, &repo),
        Action::Resolve => resolve::execute(config, status, &repo),
        Action::Restore => {
            restore::execute(config, status, &repo, InteractiveOperator::new(false))
        }
        Action::Back => Ok(()),
    }
}
