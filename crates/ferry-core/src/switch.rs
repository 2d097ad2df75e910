//! Switching between the work branch and base.

use std::path::{Path, PathBuf};

use ferry_git::{GitOps, RefScope, Repository};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::resolver::BaseResolver;

/// What a switch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Switched {
    /// Already on the branch.
    AlreadyOn(String),
    /// Checked out an existing branch.
    CheckedOut(String),
    /// Created the branch from `from`, then checked it out.
    Created { branch: String, from: String },
}

impl Switched {
    /// The branch that is now checked out.
    #[must_use]
    pub fn branch(&self) -> &str {
        match self {
            Self::AlreadyOn(branch) | Self::CheckedOut(branch) | Self::Created { branch, .. } => {
                branch
            }
        }
    }
}

/// Toggle: from the work branch go to base, from anywhere else go to work.
///
/// # Errors
/// Returns error if the target branch cannot be created or checked out.
pub fn switch_branch<G: GitOps>(repo: &G, config: &Config) -> Result<Switched> {
    let work = &config.branches.work;
    let base = BaseResolver::from_config(config).resolve(repo);

    if repo.current_branch()?.as_deref() == Some(work.as_str()) {
        switch_to_base(repo, &base, &config.remote.name)
    } else {
        switch_to_work(repo, work, &base, &config.remote.name)
    }
}

/// Check out base, creating it from `<remote>/<base>` if it only exists there.
///
/// # Errors
/// Returns `BaseMissing` if base exists neither locally nor on the remote.
pub fn switch_to_base<G: GitOps>(repo: &G, base: &str, remote: &str) -> Result<Switched> {
    if repo.current_branch()?.as_deref() == Some(base) {
        return Ok(Switched::AlreadyOn(base.to_string()));
    }

    if repo.ref_exists(base, RefScope::Local) {
        repo.checkout(base)?;
        info!(branch = base, "switched to base");
        return Ok(Switched::CheckedOut(base.to_string()));
    }

    let remote_ref = format!("{remote}/{base}");
    if repo.ref_exists(&remote_ref, RefScope::Remote) {
        repo.create_branch(base, &remote_ref)?;
        repo.checkout(base)?;
        info!(branch = base, from = %remote_ref, "created and switched to base");
        return Ok(Switched::Created {
            branch: base.to_string(),
            from: remote_ref,
        });
    }

    Err(Error::BaseMissing(base.to_string()))
}

/// Check out the work branch, creating it when missing.
///
/// A new work branch starts from base, else the current branch, else
/// `<remote>/<base>`, else HEAD.
///
/// # Errors
/// Returns error if there is no commit to start from or checkout fails.
pub fn switch_to_work<G: GitOps>(
    repo: &G,
    work: &str,
    base: &str,
    remote: &str,
) -> Result<Switched> {
    let current = repo.current_branch()?;
    if current.as_deref() == Some(work) {
        return Ok(Switched::AlreadyOn(work.to_string()));
    }

    if repo.ref_exists(work, RefScope::Local) {
        repo.checkout(work)?;
        info!(branch = work, "switched to work branch");
        return Ok(Switched::CheckedOut(work.to_string()));
    }

    let mut candidates = vec![(base.to_string(), RefScope::Local)];
    if let Some(current) = current {
        candidates.push((current, RefScope::Local));
    }
    candidates.push((format!("{remote}/{base}"), RefScope::Remote));

    let from = candidates
        .into_iter()
        .find(|(name, scope)| repo.ref_exists(name, *scope))
        .map_or_else(|| "HEAD".to_string(), |(name, _)| name);
    debug!(branch = work, %from, "creating work branch");

    repo.create_branch(work, &from)?;
    repo.checkout(work)?;
    info!(branch = work, %from, "created and switched to work branch");

    Ok(Switched::Created {
        branch: work.to_string(),
        from,
    })
}

/// Result of parking one repository on its work branch.
#[derive(Debug)]
pub struct Parked {
    pub path: PathBuf,
    pub result: Result<Switched>,
}

/// Put every repository in `paths` on its work branch.
///
/// Each repository is handled independently; one failure does not stop the
/// others.
#[must_use]
pub fn park_all(paths: &[PathBuf], config: &Config) -> Vec<Parked> {
    paths
        .iter()
        .map(|path| Parked {
            path: path.clone(),
            result: park(path, config),
        })
        .collect()
}

fn park(path: &Path, config: &Config) -> Result<Switched> {
    let repo = Repository::open(path)?;
    let base = BaseResolver::from_config(config).resolve(&repo);
    switch_to_work(&repo, &config.branches.work, &base, &config.remote.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_mocks::{MockGitOps, oid};

    #[test]
    fn test_toggle_from_work_goes_to_base() {
        let repo = MockGitOps::with_queue(&[]);
        let switched = switch_branch(&repo, &Config::default()).unwrap();

        assert_eq!(switched, Switched::CheckedOut("main".into()));
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
    }

    #[test]
    fn test_toggle_from_base_goes_to_work() {
        let repo = MockGitOps::with_queue(&[]).with_current_branch("main");
        let switched = switch_branch(&repo, &Config::default()).unwrap();

        assert_eq!(switched.branch(), "local_commit");
        assert_eq!(
            repo.current_branch().unwrap().as_deref(),
            Some("local_commit")
        );
    }

    #[test]
    fn test_missing_work_branch_is_created_from_base() {
        let repo = MockGitOps::new()
            .with_branch("main", oid(1))
            .with_branch("feature", oid(3))
            .with_current_branch("feature");

        let switched = switch_branch(&repo, &Config::default()).unwrap();
        assert_eq!(
            switched,
            Switched::Created {
                branch: "local_commit".into(),
                from: "main".into()
            }
        );
        assert_eq!(repo.branch_tip("local_commit"), Some(oid(1)));
    }

    #[test]
    fn test_missing_work_branch_falls_back_to_current() {
        let repo = MockGitOps::new()
            .with_branch("feature", oid(3))
            .with_current_branch("feature");

        let switched = switch_to_work(&repo, "local_commit", "main", "origin").unwrap();
        assert_eq!(
            switched,
            Switched::Created {
                branch: "local_commit".into(),
                from: "feature".into()
            }
        );
    }

    #[test]
    fn test_base_created_from_remote() {
        let repo = MockGitOps::new()
            .with_branch("local_commit", oid(2))
            .with_current_branch("local_commit")
            .with_remote_branch("origin/main", oid(4));

        let switched = switch_to_base(&repo, "main", "origin").unwrap();
        assert_eq!(
            switched,
            Switched::Created {
                branch: "main".into(),
                from: "origin/main".into()
            }
        );
        assert_eq!(repo.branch_tip("main"), Some(oid(4)));
    }

    #[test]
    fn test_base_missing_everywhere() {
        let repo = MockGitOps::new()
            .with_branch("local_commit", oid(2))
            .with_current_branch("local_commit");

        let err = switch_to_base(&repo, "main", "origin").unwrap_err();
        assert!(matches!(err, Error::BaseMissing(_)));
    }

    #[test]
    fn test_already_on_work() {
        let repo = MockGitOps::with_queue(&[]);
        let switched = switch_to_work(&repo, "local_commit", "main", "origin").unwrap();
        assert_eq!(switched, Switched::AlreadyOn("local_commit".into()));
        assert!(repo.calls().is_empty());
    }
}
