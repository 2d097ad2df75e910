//! Commit replay: cherry-pick, conflict resolution and amending.

use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use git2::build::CheckoutBuilder;
use git2::{CherrypickOptions, Oid, RepositoryState, Signature};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::repository::{Repository, to_git_time};
use crate::types::{ConflictSide, PickOutcome};

/// Stage bits of an index entry's flags.
const STAGE_MASK: u16 = 0x3000;

impl Repository {
    /// Replay `oid` onto HEAD through the working copy.
    ///
    /// On a clean apply the new commit keeps the original author and message.
    /// On conflict the repository is left mid-cherry-pick with conflict
    /// markers in the working copy.
    ///
    /// # Errors
    /// Returns error for merge commits or if the working copy blocks checkout.
    pub fn cherry_pick(&self, oid: Oid) -> Result<PickOutcome> {
        let commit = self.inner.find_commit(oid)?;
        if commit.parent_count() > 1 {
            return Err(Error::MergeCommit(oid.to_string()));
        }

        let mut opts = CherrypickOptions::new();
        self.inner.cherrypick(&commit, Some(&mut opts))?;

        let files = self.conflicting_files()?;
        if !files.is_empty() {
            debug!(commit = %oid, ?files, "cherry-pick stopped on conflicts");
            return Ok(PickOutcome::Conflict(files));
        }

        self.commit_picked(&commit)
    }

    /// Resolve every conflicted path to one side and write it to the working copy.
    ///
    /// # Errors
    /// Returns error if no cherry-pick is in progress or the index cannot be written.
    pub fn resolve_conflicts(&self, side: ConflictSide) -> Result<()> {
        self.require_cherry_pick()?;
        let workdir = self.workdir().ok_or(Error::BareRepository)?.to_path_buf();

        let mut index = self.inner.index()?;
        let conflicts = index
            .conflicts()?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for conflict in conflicts {
            let Some(path) = conflict
                .our
                .as_ref()
                .or(conflict.their.as_ref())
                .or(conflict.ancestor.as_ref())
                .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
            else {
                continue;
            };

            index.remove_path(Path::new(&path))?;

            let chosen = match side {
                ConflictSide::Ours => conflict.our,
                ConflictSide::Theirs => conflict.their,
            };

            if let Some(mut entry) = chosen {
                entry.flags &= !STAGE_MASK;
                index.add(&entry)?;
            } else {
                // Deleted on the chosen side
                let file = workdir.join(&path);
                if file.exists() {
                    fs::remove_file(file)?;
                }
            }
        }

        index.write()?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner
            .checkout_index(Some(&mut index), Some(&mut checkout))?;
        debug!(%side, "resolved conflicts");

        Ok(())
    }

    /// Commit the resolved index of the cherry-pick in progress.
    ///
    /// # Errors
    /// Returns `UnresolvedConflicts` if conflicts remain, `NoCherryPick` if
    /// nothing is in progress.
    pub fn cherry_pick_continue(&self) -> Result<PickOutcome> {
        self.require_cherry_pick()?;

        let files = self.conflicting_files()?;
        if !files.is_empty() {
            return Err(Error::UnresolvedConflicts(files));
        }

        let head_file = fs::read_to_string(self.git_dir().join("CHERRY_PICK_HEAD"))
            .map_err(|_| Error::NoCherryPick)?;
        let picked_id = Oid::from_str(head_file.trim()).map_err(|_| Error::NoCherryPick)?;
        let picked = self.inner.find_commit(picked_id)?;

        self.commit_picked(&picked)
    }

    /// Abandon the cherry-pick in progress, restoring HEAD's tree.
    ///
    /// # Errors
    /// Returns error if the reset fails.
    pub fn cherry_pick_abort(&self) -> Result<()> {
        self.discard_pick()?;
        debug!("cherry-pick aborted");
        Ok(())
    }

    /// Drop the conflicting commit so replay can continue with the next one.
    ///
    /// # Errors
    /// Returns error if the reset fails.
    pub fn cherry_pick_skip(&self) -> Result<()> {
        self.discard_pick()?;
        debug!("cherry-pick skipped");
        Ok(())
    }

    /// Rewrite HEAD's author and committer timestamps.
    ///
    /// Tree and message are kept. With `reset_author` the author becomes the
    /// configured identity; otherwise the original author name and email stay.
    ///
    /// # Errors
    /// Returns error if HEAD is unborn or the identity is not configured.
    pub fn amend_current(
        &self,
        author_time: &DateTime<FixedOffset>,
        committer_time: &DateTime<FixedOffset>,
        reset_author: bool,
    ) -> Result<Oid> {
        let head = self.inner.head()?.peel_to_commit()?;
        let identity = self.local_identity()?;

        let author_when = to_git_time(author_time);
        let author = if reset_author {
            Signature::new(&identity.name, &identity.email, &author_when)?
        } else {
            let original = head.author();
            Signature::new(
                &String::from_utf8_lossy(original.name_bytes()),
                &String::from_utf8_lossy(original.email_bytes()),
                &author_when,
            )?
        };
        let committer = Signature::new(
            &identity.name,
            &identity.email,
            &to_git_time(committer_time),
        )?;

        let amended = head.amend(Some("HEAD"), Some(&author), Some(&committer), None, None, None)?;
        debug!(from = %head.id(), to = %amended, "amended HEAD");

        Ok(amended)
    }

    /// Paths with conflicts in the index.
    ///
    /// # Errors
    /// Returns error if the index cannot be read.
    pub fn conflicting_files(&self) -> Result<Vec<String>> {
        let mut index = self.inner.index()?;
        index.read(false)?;
        if !index.has_conflicts() {
            return Ok(vec![]);
        }

        let mut files: Vec<String> = index
            .conflicts()?
            .filter_map(std::result::Result::ok)
            .filter_map(|c| c.our.or(c.their).or(c.ancestor))
            .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
            .collect();
        files.sort();
        files.dedup();

        Ok(files)
    }

    /// Commit the current index as a replay of `picked`, or report it empty.
    fn commit_picked(&self, picked: &git2::Commit<'_>) -> Result<PickOutcome> {
        let mut index = self.inner.index()?;
        let tree_id = index.write_tree()?;
        let head = self.inner.head()?.peel_to_commit()?;

        if head.tree_id() == tree_id {
            self.inner.cleanup_state()?;
            debug!(commit = %picked.id(), "replay produced no changes");
            return Ok(PickOutcome::Empty);
        }

        let tree = self.inner.find_tree(tree_id)?;
        let committer = self.inner.signature()?;
        let message = String::from_utf8_lossy(picked.message_raw_bytes()).into_owned();

        let new_id = self.inner.commit(
            Some("HEAD"),
            &picked.author(),
            &committer,
            &message,
            &tree,
            &[&head],
        )?;
        self.inner.cleanup_state()?;
        debug!(commit = %picked.id(), new = %new_id, "replayed commit");

        Ok(PickOutcome::Applied(new_id))
    }

    fn discard_pick(&self) -> Result<()> {
        let head = self.inner.head()?.peel_to_commit()?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner
            .reset(head.as_object(), git2::ResetType::Hard, Some(&mut checkout))?;
        self.inner.cleanup_state()?;
        Ok(())
    }

    fn require_cherry_pick(&self) -> Result<()> {
        match self.state() {
            RepositoryState::CherryPick | RepositoryState::CherryPickSequence => Ok(()),
            other => {
                warn!(state = ?other, "expected a cherry-pick in progress");
                Err(Error::NoCherryPick)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::{commit_file, init_test_repo};
    use std::fs;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-17T12:00:00+02:00").unwrap()
    }

    #[test]
    fn test_cherry_pick_applies_and_keeps_message() {
        let (temp, repo) = init_test_repo();
        repo.create_branch("work", "HEAD").unwrap();
        repo.checkout("work").unwrap();
        let c1 = commit_file(&temp, &repo, "a.txt", "a\n", "Add a");
        repo.checkout("main").unwrap();
        let main_tip = commit_file(&temp, &repo, "b.txt", "b\n", "Add b on main");

        let outcome = repo.cherry_pick(c1).unwrap();
        let PickOutcome::Applied(new_id) = outcome else {
            panic!("expected applied, got {outcome:?}");
        };

        assert_ne!(new_id, c1);
        assert_eq!(repo.branch_commit("main").unwrap(), new_id);
        assert_eq!(
            repo.inner.find_commit(new_id).unwrap().parent_id(0).unwrap(),
            main_tip
        );
        assert_eq!(repo.read_commit_metadata(new_id).unwrap().summary(), "Add a");
        assert!(repo.in_progress_operation().is_none());
        assert!(temp.path().join("a.txt").exists());
    }

    #[test]
    fn test_cherry_pick_empty_when_already_present() {
        let (temp, repo) = init_test_repo();
        repo.create_branch("work", "HEAD").unwrap();
        repo.checkout("work").unwrap();
        let c1 = commit_file(&temp, &repo, "a.txt", "a\n", "Add a");
        repo.checkout("main").unwrap();
        commit_file(&temp, &repo, "a.txt", "a\n", "Add a on main");
        let tip = repo.head_commit().unwrap();

        assert_eq!(repo.cherry_pick(c1).unwrap(), PickOutcome::Empty);
        assert_eq!(repo.head_commit().unwrap(), tip);
        assert!(repo.in_progress_operation().is_none());
    }

    fn conflicting_setup() -> (tempfile::TempDir, Repository, Oid) {
        let (temp, repo) = init_test_repo();
        commit_file(&temp, &repo, "shared.txt", "base\n", "Add shared");
        repo.create_branch("work", "HEAD").unwrap();
        repo.checkout("work").unwrap();
        let incoming = commit_file(&temp, &repo, "shared.txt", "theirs\n", "Change on work");
        repo.checkout("main").unwrap();
        commit_file(&temp, &repo, "shared.txt", "ours\n", "Change on main");
        (temp, repo, incoming)
    }

    #[test]
    fn test_cherry_pick_conflict_then_theirs() {
        let (temp, repo, incoming) = conflicting_setup();

        let outcome = repo.cherry_pick(incoming).unwrap();
        assert_eq!(outcome, PickOutcome::Conflict(vec!["shared.txt".into()]));
        assert_eq!(repo.in_progress_operation(), Some(crate::InProgressOp::CherryPick));

        repo.resolve_conflicts(ConflictSide::Theirs).unwrap();
        assert!(!repo.inner.index().unwrap().has_conflicts());
        let outcome = repo.cherry_pick_continue().unwrap();

        assert!(matches!(outcome, PickOutcome::Applied(_)));
        assert_eq!(
            fs::read_to_string(temp.path().join("shared.txt")).unwrap(),
            "theirs\n"
        );
        assert!(repo.in_progress_operation().is_none());
        assert!(repo.is_clean().unwrap());
    }

    #[test]
    fn test_cherry_pick_conflict_ours_is_empty() {
        let (temp, repo, incoming) = conflicting_setup();
        let tip = repo.head_commit().unwrap();

        repo.cherry_pick(incoming).unwrap();
        repo.resolve_conflicts(ConflictSide::Ours).unwrap();

        assert_eq!(repo.cherry_pick_continue().unwrap(), PickOutcome::Empty);
        assert_eq!(repo.head_commit().unwrap(), tip);
        assert_eq!(
            fs::read_to_string(temp.path().join("shared.txt")).unwrap(),
            "ours\n"
        );
    }

    #[test]
    fn test_cherry_pick_skip_restores_head() {
        let (temp, repo, incoming) = conflicting_setup();

        repo.cherry_pick(incoming).unwrap();
        repo.cherry_pick_skip().unwrap();

        assert!(repo.in_progress_operation().is_none());
        assert!(repo.is_clean().unwrap());
        assert_eq!(
            fs::read_to_string(temp.path().join("shared.txt")).unwrap(),
            "ours\n"
        );
    }

    #[test]
    fn test_continue_without_resolution_fails() {
        let (_temp, repo, incoming) = conflicting_setup();

        repo.cherry_pick(incoming).unwrap();
        let err = repo.cherry_pick_continue().unwrap_err();
        assert!(matches!(err, Error::UnresolvedConflicts(_)));
        repo.cherry_pick_abort().unwrap();
    }

    #[test]
    fn test_amend_current_rewrites_dates_and_author() {
        let (temp, repo) = init_test_repo();
        let original = commit_file(&temp, &repo, "a.txt", "a\n", "Add a\n\nDetails");
        let before = repo.find_commit(original).unwrap().tree_id();

        {
            let mut config = repo.inner.config().unwrap();
            config.set_str("user.email", "operator@example.com").unwrap();
        }

        let amended = repo.amend_current(&now(), &now(), true).unwrap();
        let meta = repo.read_commit_metadata(amended).unwrap();

        assert_eq!(meta.author_date, now());
        assert_eq!(meta.committer_date, now());
        assert_eq!(meta.author_email, "operator@example.com");
        assert_eq!(meta.message, "Add a\n\nDetails");
        assert_eq!(repo.find_commit(amended).unwrap().tree_id(), before);
    }

    #[test]
    fn test_amend_current_keeps_author_without_reset() {
        let (temp, repo) = init_test_repo();
        commit_file(&temp, &repo, "a.txt", "a\n", "Add a");
        {
            let mut config = repo.inner.config().unwrap();
            config.set_str("user.email", "operator@example.com").unwrap();
        }

        let amended = repo.amend_current(&now(), &now(), false).unwrap();
        let meta = repo.read_commit_metadata(amended).unwrap();

        assert_eq!(meta.author_email, "test@example.com");
        assert_eq!(meta.author_date, now());
    }
}
