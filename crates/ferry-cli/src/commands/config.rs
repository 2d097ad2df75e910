//! `ferry config` command - Print the effective configuration.

use anyhow::{Context, Result};
use ferry_core::Config;

use crate::output;

/// Run the config command.
pub fn run(path: bool) -> Result<()> {
    if path {
        let location = Config::default_path().context("No config directory on this platform")?;
        output::essential(&location.display().to_string());
        return Ok(());
    }

    let config = Config::load_default().context("Failed to load config")?;
    print!("{}", config.to_toml()?);
    Ok(())
}
