//! Ferry CLI - move queued work-branch commits onto the base branch.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod operator;
mod output;

use commands::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);
    init_tracing();

    let root = cli.root.as_deref();
    let result = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Status { json } => commands::status::run(root, json),
        Commands::Preview { repo, json } => commands::preview::run(root, &repo, json),
        Commands::Migrate {
            repo,
            count,
            step,
            yes,
        } => commands::migrate::run(root, &repo, count, step, yes),
        Commands::Switch { repo } => commands::switch::run(root, &repo),
        Commands::Park => commands::switch::run_park(root),
        Commands::Restore { repo, yes } => commands::restore::run(root, &repo, yes),
        Commands::Resolve { repo } => commands::resolve::run(root, &repo),
        Commands::Menu => commands::menu::run(root),
        Commands::Config { path } => commands::config::run(path),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `FERRY_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("FERRY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
