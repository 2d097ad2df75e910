//! Repository discovery under a root directory.

use std::fs;
use std::path::{Path, PathBuf};

use ferry_git::{GitOps, RefScope, Repository};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::queue::PendingQueue;
use crate::resolver::BaseResolver;

/// Snapshot of one repository for the status table.
#[derive(Debug, Clone, Serialize)]
pub struct RepoStatus {
    pub path: PathBuf,
    pub name: String,
    /// Checked-out branch, or `HEAD` when detached or unborn.
    pub branch: String,
    pub has_work_branch: bool,
    pub base: String,
    pub pending: usize,
    pub clean: bool,
}

impl RepoStatus {
    /// Whether the work branch is checked out.
    #[must_use]
    pub fn on_work_branch(&self, config: &Config) -> bool {
        self.branch == config.branches.work
    }
}

/// Immediate child directories of `root` that contain a `.git` directory,
/// sorted by name.
///
/// # Errors
/// Returns `NotADirectory` if `root` is not a directory.
pub fn discover_repos(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut repos: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && path.join(".git").is_dir())
        .collect();
    repos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!(root = %root.display(), found = repos.len(), "discovered repositories");
    Ok(repos)
}

/// Inspect a single repository.
///
/// Creates the base branch first if it is missing, so the pending count is
/// computed against a real ref.
///
/// # Errors
/// Returns error if the repository cannot be opened or read.
pub fn inspect<G: GitOps>(repo: &G, path: &Path, config: &Config) -> Result<RepoStatus> {
    let work = &config.branches.work;
    let base = BaseResolver::from_config(config).ensure_exists(repo)?.name;
    let pending = PendingQueue::compute(repo, &base, work)?.len();

    Ok(RepoStatus {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        branch: repo
            .current_branch()?
            .unwrap_or_else(|| "HEAD".to_string()),
        has_work_branch: repo.ref_exists(work, RefScope::Local),
        base,
        pending,
        clean: repo.is_clean()?,
    })
}

/// Inspect every repository under `root`. Repositories that cannot be read
/// are logged and left out.
///
/// # Errors
/// Returns `NotADirectory` if `root` is not a directory.
pub fn scan(root: &Path, config: &Config) -> Result<Vec<RepoStatus>> {
    let statuses = discover_repos(root)?
        .into_iter()
        .filter_map(|path| {
            let status = Repository::open(&path)
                .map_err(Error::from)
                .and_then(|repo| inspect(&repo, &path, config));
            match status {
                Ok(status) => Some(status),
                Err(err) => {
                    warn!(repo = %path.display(), error = %err, "skipping repository");
                    None
                }
            }
        })
        .collect();

    Ok(statuses)
}

/// Find a scanned repository by directory name or path.
#[must_use]
pub fn find_repo<'s>(statuses: &'s [RepoStatus], query: &str) -> Option<&'s RepoStatus> {
    statuses
        .iter()
        .find(|s| s.name == query)
        .or_else(|| statuses.iter().find(|s| s.path == Path::new(query)))
}
