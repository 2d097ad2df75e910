//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub mod completions;
pub mod config;
pub mod menu;
pub mod migrate;
pub mod preview;
pub mod resolve;
pub mod restore;
pub mod status;
pub mod switch;
pub mod utils;

/// Ferry - move queued work-branch commits onto the base branch with a
/// fresh timestamp, then push.
#[derive(Debug, Parser)]
#[command(name = "ferry", version, about, long_about = None)]
pub struct Cli {
    /// Directory whose child repositories are managed
    /// (default: $FERRY_ROOT, then the config file, then ~/GitHub).
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Only print errors and essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show every repository with its branch, base and pending count.
    #[command(alias = "ls")]
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the pending commits of a repository, oldest first.
    Preview {
        /// Repository directory name or path.
        repo: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Move the oldest pending commits to base, push, and update the work branch.
    #[command(alias = "mv")]
    Migrate {
        /// Repository directory name or path.
        repo: String,

        /// Number of commits to move (asks when omitted).
        #[arg(short = 'n', long = "count", value_name = "N")]
        count: Option<usize>,

        /// Confirm each commit before it is replayed.
        #[arg(long)]
        step: bool,

        /// Accept stash and rewrite confirmations without asking.
        /// Conflicts are still asked about.
        #[arg(short, long)]
        yes: bool,
    },

    /// Toggle a repository between its work branch and base.
    Switch {
        /// Repository directory name or path.
        repo: String,
    },

    /// Put every repository on its work branch.
    Park,

    /// Reset the work branch to its last state before it was reset onto base.
    Restore {
        /// Repository directory name or path.
        repo: String,

        /// Restore without asking for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the base branch of a repository, creating it if missing.
    Resolve {
        /// Repository directory name or path.
        repo: String,
    },

    /// Pick a repository and an action interactively.
    Menu,

    /// Print the effective configuration.
    Config {
        /// Print the config file location instead.
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}
