//! Configuration management for Ferry.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ferry configuration loaded from `<config dir>/ferry/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Branch names.
    #[serde(default)]
    pub branches: BranchConfig,

    /// Remote settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Stash settings.
    #[serde(default)]
    pub stash: StashConfig,

    /// Migration behaviour.
    #[serde(default)]
    pub migrate: MigrateConfig,
}

impl Config {
    const FILE_NAME: &'static str = "config.toml";

    /// Load config from a TOML file.
    ///
    /// # Errors
    /// Returns error if file can't be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the default location, or defaults if there is none.
    ///
    /// # Errors
    /// Returns error if an existing file can't be read or parsed.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save config to a TOML file.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render the config as TOML.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// `<config dir>/ferry/config.toml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ferry").join(Self::FILE_NAME))
    }

    /// Reject branch names that would make base resolution ambiguous.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("branches.work", &self.branches.work),
            ("branches.primary", &self.branches.primary),
            ("branches.legacy", &self.branches.legacy),
            ("remote.name", &self.remote.name),
        ];
        for (key, value) in names {
            let value = value.trim();
            if value.is_empty() || value == "HEAD" {
                return Err(Error::InvalidConfig(format!(
                    "{key} must name a branch, got '{value}'"
                )));
            }
        }

        if self.branches.work == self.branches.primary || self.branches.work == self.branches.legacy
        {
            return Err(Error::InvalidConfig(
                "branches.work must differ from the base branch names".into(),
            ));
        }

        Ok(())
    }
}

/// General Ferry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory whose immediate children are scanned for repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Branch roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Private branch holding not-yet-migrated commits.
    #[serde(default = "default_work")]
    pub work: String,

    /// Preferred base branch name.
    #[serde(default = "default_primary")]
    pub primary: String,

    /// Older base branch name, used when the primary does not exist.
    #[serde(default = "default_legacy")]
    pub legacy: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            work: default_work(),
            primary: default_primary(),
            legacy: default_legacy(),
        }
    }
}

fn default_work() -> String {
    "local_commit".into()
}

fn default_primary() -> String {
    "main".into()
}

fn default_legacy() -> String {
    "master".into()
}

/// Remote settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Remote to push the base branch to.
    #[serde(default = "default_remote")]
    pub name: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            name: default_remote(),
        }
    }
}

fn default_remote() -> String {
    "origin".into()
}

/// Stash settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StashConfig {
    /// Prefix for the label of stashes ferry creates.
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            label_prefix: default_label_prefix(),
        }
    }
}

fn default_label_prefix() -> String {
    "ferry auto-stash".into()
}

/// Migration behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Confirm each commit before it is replayed.
    #[serde(default)]
    pub step_mode: bool,

    /// Keep a backup branch of the work branch before rewriting it.
    #[serde(default = "default_true")]
    pub backup_before_rewrite: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            step_mode: false,
            backup_before_rewrite: true,
        }
    }
}

const fn default_true() -> bool {
    true
}
