//! Pending queue: commits on the work branch that base does not have yet.

use chrono::{DateTime, FixedOffset};
use ferry_git::{GitOps, Oid, RefScope};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Commits reachable from the work branch but not from base, oldest first.
///
/// Ordered by ancestry, never by timestamp. Recompute it right before use;
/// it is only valid for the instant it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQueue {
    pub base: String,
    pub work: String,
    pub commits: Vec<Oid>,
}

/// One row of a queue preview.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub id: String,
    pub short_id: String,
    pub date: DateTime<FixedOffset>,
    pub summary: String,
}

impl PendingQueue {
    /// Compute the queue fresh from the repository.
    ///
    /// Empty when either branch is missing or work is already contained in
    /// base.
    ///
    /// # Errors
    /// Returns error if the commit walk fails.
    pub fn compute<G: GitOps>(repo: &G, base: &str, work: &str) -> Result<Self> {
        let empty = || Self {
            base: base.to_string(),
            work: work.to_string(),
            commits: Vec::new(),
        };

        if !repo.ref_exists(work, RefScope::Local) || !repo.ref_exists(base, RefScope::Local) {
            debug!(base, work, "branch missing, queue is empty");
            return Ok(empty());
        }

        let base_tip = repo.branch_commit(base)?;
        let work_tip = repo.branch_commit(work)?;
        if base_tip == work_tip {
            return Ok(empty());
        }

        let commits = repo.commit_range(base_tip, work_tip)?;
        debug!(base, work, pending = commits.len(), "computed pending queue");

        Ok(Self {
            base: base.to_string(),
            work: work.to_string(),
            commits,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// The oldest `n` commits.
    #[must_use]
    pub fn prefix(&self, n: usize) -> &[Oid] {
        &self.commits[..n.min(self.commits.len())]
    }

    /// Describe each pending commit for display.
    ///
    /// # Errors
    /// Returns error if a commit cannot be read.
    pub fn preview<G: GitOps>(&self, repo: &G) -> Result<Vec<QueueEntry>> {
        self.commits
            .iter()
            .map(|&id| {
                let meta = repo.read_commit_metadata(id)?;
                Ok(QueueEntry {
                    id: id.to_string(),
                    short_id: ferry_git::short_id(id),
                    date: meta.author_date,
                    summary: meta.summary().to_string(),
                })
            })
            .collect()
    }
}
