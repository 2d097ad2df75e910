//! Base branch resolution.
//!
//! Decides which branch a repository integrates into and makes sure it
//! exists locally so range computations against it never fail.

use ferry_git::{GitOps, RefScope};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// The base branch after [`BaseResolver::ensure_exists`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseBranch {
    /// Local branch name.
    pub name: String,
    /// Revision the branch was created from, if it had to be created.
    pub created_from: Option<String>,
}

/// Resolves the integration target of a repository.
#[derive(Debug, Clone)]
pub struct BaseResolver {
    primary: String,
    legacy: String,
    remote: String,
}

impl BaseResolver {
    /// Create a resolver with explicit branch and remote names.
    #[must_use]
    pub fn new(
        primary: impl Into<String>,
        legacy: impl Into<String>,
        remote: impl Into<String>,
    ) -> Self {
        Self {
            primary: primary.into(),
            legacy: legacy.into(),
            remote: remote.into(),
        }
    }

    /// Create a resolver from the branch and remote settings.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.branches.primary,
            &config.branches.legacy,
            &config.remote.name,
        )
    }

    /// Pick the base branch name.
    ///
    /// Local primary, then local legacy, then the remote's default branch,
    /// then the primary name even if it does not exist yet. Never `HEAD`.
    #[must_use]
    pub fn resolve<G: GitOps>(&self, repo: &G) -> String {
        if repo.ref_exists(&self.primary, RefScope::Local) {
            return self.primary.clone();
        }
        if repo.ref_exists(&self.legacy, RefScope::Local) {
            return self.legacy.clone();
        }

        match repo.remote_default_branch(&self.remote) {
            Some(name) if !name.is_empty() && name != "HEAD" => name,
            _ => self.primary.clone(),
        }
    }

    /// Resolve the base branch and create it locally if it is missing.
    ///
    /// The current branch is never changed and existing branches never move.
    ///
    /// # Errors
    /// Returns `BaseMissing` if there is nothing to create the branch from.
    pub fn ensure_exists<G: GitOps>(&self, repo: &G) -> Result<BaseBranch> {
        let name = self.resolve(repo);
        if repo.ref_exists(&name, RefScope::Local) {
            return Ok(BaseBranch {
                name,
                created_from: None,
            });
        }

        for (start_point, scope) in self.seed_candidates(&name) {
            if !repo.ref_exists(&start_point, scope) {
                continue;
            }
            repo.create_branch(&name, &start_point)?;
            info!(branch = %name, from = %start_point, "created base branch");
            return Ok(BaseBranch {
                name,
                created_from: Some(start_point),
            });
        }

        if repo.head_commit().is_ok() {
            repo.create_branch(&name, "HEAD")?;
            info!(branch = %name, "created base branch from HEAD");
            return Ok(BaseBranch {
                name,
                created_from: Some("HEAD".to_string()),
            });
        }

        debug!(branch = %name, "no start point for base branch");
        Err(Error::BaseMissing(name))
    }

    fn seed_candidates(&self, name: &str) -> Vec<(String, RefScope)> {
        let remote = |branch: &str| (format!("{}/{branch}", self.remote), RefScope::Remote);

        if name == self.primary {
            vec![
                (self.legacy.clone(), RefScope::Local),
                remote(&self.primary),
                remote(&self.legacy),
            ]
        } else {
            vec![remote(name)]
        }
    }
}

impl Default for BaseResolver {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_mocks::{MockGitOps, oid};

    #[test]
    fn test_resolve_prefers_primary() {
        let repo = MockGitOps::new()
            .with_branch("main", oid(1))
            .with_branch("master", oid(2));
        assert_eq!(BaseResolver::default().resolve(&repo), "main");
    }

    #[test]
    fn test_resolve_falls_back_to_legacy() {
        let repo = MockGitOps::new().with_branch("master", oid(2));
        assert_eq!(BaseResolver::default().resolve(&repo), "master");
    }

    #[test]
    fn test_resolve_uses_remote_default() {
        let repo = MockGitOps::new()
            .with_branch("local_commit", oid(1))
            .with_remote_default("trunk");
        assert_eq!(BaseResolver::default().resolve(&repo), "trunk");
    }

    #[test]
    fn test_resolve_never_returns_head() {
        let repo = MockGitOps::new().with_remote_default("HEAD");
        assert_eq!(BaseResolver::default().resolve(&repo), "main");

        let empty = MockGitOps::new();
        assert_eq!(BaseResolver::default().resolve(&empty), "main");
    }

    #[test]
    fn test_ensure_exists_keeps_existing_branch() {
        let repo = MockGitOps::new().with_branch("main", oid(1));
        let base = BaseResolver::default().ensure_exists(&repo).unwrap();

        assert_eq!(base.name, "main");
        assert_eq!(base.created_from, None);
        assert!(repo.calls().iter().all(|c| !c.starts_with("create_branch")));
    }

    #[test]
    fn test_ensure_exists_creates_from_remote_primary() {
        let repo = MockGitOps::new()
            .with_branch("local_commit", oid(3))
            .with_current_branch("local_commit")
            .with_remote_branch("origin/main", oid(4));

        let base = BaseResolver::default().ensure_exists(&repo).unwrap();

        assert_eq!(base.created_from.as_deref(), Some("origin/main"));
        assert_eq!(repo.branch_tip("main"), Some(oid(4)));
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("local_commit"));
    }

    #[test]
    fn test_ensure_exists_prefers_remote_primary_over_remote_legacy() {
        let repo = MockGitOps::new()
            .with_head(oid(9))
            .with_remote_branch("origin/master", oid(5))
            .with_remote_branch("origin/main", oid(4));

        let base = BaseResolver::default().ensure_exists(&repo).unwrap();
        assert_eq!(base.created_from.as_deref(), Some("origin/main"));
    }

    #[test]
    fn test_ensure_exists_creates_remote_default_from_its_remote_branch() {
        let repo = MockGitOps::new()
            .with_head(oid(9))
            .with_remote_default("trunk")
            .with_remote_branch("origin/trunk", oid(6));

        let base = BaseResolver::default().ensure_exists(&repo).unwrap();
        assert_eq!(base.name, "trunk");
        assert_eq!(repo.branch_tip("trunk"), Some(oid(6)));
    }

    #[test]
    fn test_ensure_exists_falls_back_to_head() {
        let repo = MockGitOps::new().with_head(oid(7));
        let base = BaseResolver::default().ensure_exists(&repo).unwrap();

        assert_eq!(base.created_from.as_deref(), Some("HEAD"));
        assert_eq!(repo.branch_tip("main"), Some(oid(7)));
        let created = repo
            .calls()
            .iter()
            .filter(|c| c.starts_with("create_branch"))
            .count();
        assert_eq!(created, 1);
    }

    #[test]
    fn test_ensure_exists_unborn_repository() {
        let repo = MockGitOps::new();
        let err = BaseResolver::default().ensure_exists(&repo).unwrap_err();
        assert!(matches!(err, Error::BaseMissing(name) if name == "main"));
    }
}
