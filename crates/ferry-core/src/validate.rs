//! Pre-push checks on the commits a migration created, and the push itself.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use ferry_git::{GitOps, Identity, Oid, PushOutcome};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The remote's default branch is not the branch about to be pushed.
    RemoteDefaultMismatch { remote_default: String, base: String },
    /// Author date is on another day than the run's timestamp.
    DateMismatch {
        commit: Oid,
        found: NaiveDate,
        expected: NaiveDate,
    },
    /// Author email differs from the configured identity.
    EmailMismatch {
        commit: Oid,
        found: String,
        expected: String,
    },
    /// Author name differs from the configured identity.
    NameMismatch {
        commit: Oid,
        found: String,
        expected: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteDefaultMismatch {
                remote_default,
                base,
            } => write!(
                f,
                "remote default branch is '{remote_default}' but base is '{base}'"
            ),
            Self::DateMismatch {
                commit,
                found,
                expected,
            } => write!(
                f,
                "{} is dated {found}, expected {expected}",
                ferry_git::short_id(*commit)
            ),
            Self::EmailMismatch {
                commit,
                found,
                expected,
            } => write!(
                f,
                "{} has author email '{found}', expected '{expected}'",
                ferry_git::short_id(*commit)
            ),
            Self::NameMismatch {
                commit,
                found,
                expected,
            } => write!(
                f,
                "{} has author name '{found}', expected '{expected}'",
                ferry_git::short_id(*commit)
            ),
        }
    }
}

/// All failed checks of one validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Turn a failed report into `Error::ValidationFailed`.
    ///
    /// # Errors
    /// Returns the report as an error if any check failed.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::ValidationFailed(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        f.write_str(&lines.join("; "))
    }
}

/// Checks moved commits and pushes base.
pub struct PushValidator<'a, G: GitOps> {
    repo: &'a G,
    remote: String,
}

impl<'a, G: GitOps> PushValidator<'a, G> {
    #[must_use]
    pub fn new(repo: &'a G, remote: impl Into<String>) -> Self {
        Self {
            repo,
            remote: remote.into(),
        }
    }

    /// Run every check and collect the failures.
    ///
    /// # Errors
    /// Returns error if a moved commit cannot be read.
    pub fn check(
        &self,
        base: &str,
        moved: &[Oid],
        captured_at: &DateTime<FixedOffset>,
        identity: &Identity,
    ) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        if let Some(remote_default) = self.repo.remote_default_branch(&self.remote) {
            if remote_default != base {
                report.violations.push(Violation::RemoteDefaultMismatch {
                    remote_default,
                    base: base.to_string(),
                });
            }
        }

        let expected_day = captured_at.date_naive();
        for &commit in moved {
            let meta = self.repo.read_commit_metadata(commit)?;

            let found_day = meta
                .author_date
                .with_timezone(captured_at.offset())
                .date_naive();
            if found_day != expected_day {
                report.violations.push(Violation::DateMismatch {
                    commit,
                    found: found_day,
                    expected: expected_day,
                });
            }
            if meta.author_email != identity.email {
                report.violations.push(Violation::EmailMismatch {
                    commit,
                    found: meta.author_email.clone(),
                    expected: identity.email.clone(),
                });
            }
            if meta.author_name != identity.name {
                report.violations.push(Violation::NameMismatch {
                    commit,
                    found: meta.author_name,
                    expected: identity.name.clone(),
                });
            }
        }

        if !report.is_ok() {
            warn!(base, violations = report.violations.len(), "pre-push validation failed");
        }
        Ok(report)
    }

    /// Push base to its counterpart on the remote.
    ///
    /// # Errors
    /// Returns `PushRejected` if the remote refuses the update.
    pub fn push(&self, base: &str) -> Result<()> {
        match self.repo.push(&self.remote, base)? {
            PushOutcome::Pushed => {
                info!(remote = %self.remote, branch = base, "pushed base");
                Ok(())
            }
            PushOutcome::Rejected(reason) => Err(Error::PushRejected {
                branch: base.to_string(),
                reason,
            }),
        }
    }

    /// Validate, then push only if every check passed.
    ///
    /// # Errors
    /// Returns `ValidationFailed` without pushing, or any push error.
    pub fn validate_and_push(
        &self,
        base: &str,
        moved: &[Oid],
        captured_at: &DateTime<FixedOffset>,
        identity: &Identity,
    ) -> Result<()> {
        self.check(base, moved, captured_at, identity)?
            .into_result()?;
        self.push(base)
    }
}
