use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ferry_core::{Config, RepoStatus};
use ferry_git::Repository;

/// Environment variable naming the managed directory.
pub const ROOT_ENV: &str = "FERRY_ROOT";

/// Effective config plus the directory whose children are managed.
pub struct Workspace {
    pub config: Config,
    pub root: PathBuf,
}

impl Workspace {
    /// Load the config and pick the root directory.
    pub fn load(root: Option<&Path>) -> Result<Self> {
        let config = Config::load_default().context("Failed to load config")?;
        let root = pick_root(
            root,
            env::var_os(ROOT_ENV).map(PathBuf::from),
            &config,
            dirs::home_dir(),
        )
        .context("Cannot find a home directory; pass --root or set FERRY_ROOT")?;

        Ok(Self { config, root })
    }

    /// Inspect every repository under the root.
    pub fn scan(&self) -> Result<Vec<RepoStatus>> {
        ferry_core::scan(&self.root, &self.config)
            .with_context(|| format!("Cannot scan {}", self.root.display()))
    }

    /// Find one repository by directory name or path and open it.
    pub fn open(&self, query: &str) -> Result<(RepoStatus, Repository)> {
        let statuses = self.scan()?;
        let status = ferry_core::find_repo(&statuses, query)
            .cloned()
            .with_context(|| {
                format!("No repository named '{query}' under {}", self.root.display())
            })?;
        let repo = open_repo(&status.path)?;
        Ok((status, repo))
    }
}

/// Open a repository that was found by a scan.
pub fn open_repo(path: &Path) -> Result<Repository> {
    Repository::open(path).with_context(|| format!("Cannot open {}", path.display()))
}

/// `--root`, then `$FERRY_ROOT`, then the config file, then `~/GitHub`.
fn pick_root(
    arg: Option<&Path>,
    from_env: Option<PathBuf>,
    config: &Config,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    arg.map(Path::to_path_buf)
        .or_else(|| from_env.filter(|p| !p.as_os_str().is_empty()))
        .or_else(|| config.general.root.clone())
        .or_else(|| home.map(|h| h.join("GitHub")))
}
