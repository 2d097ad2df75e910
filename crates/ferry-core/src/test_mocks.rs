//! Mock implementations for testing core logic.
//!
//! `MockGitOps` keeps branches, stash and replay results in memory so the
//! engine, validator, reconciler and guard can be exercised without real
//! repositories. Replay results are scripted per commit.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use ferry_git::{
    CommitMetadata, ConflictSide, GitOps, Identity, InProgressOp, Oid, PickOutcome, PushOutcome,
    RefScope, ReflogEntry, Result as GitResult, StashHandle, StashPop,
};

use crate::prompt::{ConflictChoice, MigrationPrompt, ReconcilePrompt, StashPrompt};

/// Deterministic commit id for tests.
pub fn oid(n: u8) -> Oid {
    Oid::from_bytes(&[n; 20]).unwrap()
}

/// A fixed point in time well before any test run.
pub fn old_date() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-03-01T09:30:00+00:00").unwrap()
}

/// Mock implementation of `GitOps` for testing.
pub struct MockGitOps {
    pub current_branch: RefCell<Option<String>>,
    pub detached_head: RefCell<Option<Oid>>,
    pub branches: RefCell<HashMap<String, Oid>>,
    pub remote_branches: RefCell<HashMap<String, Oid>>,
    pub remote_default: RefCell<Option<String>>,
    pub range: RefCell<Vec<Oid>>,
    pub metadata: RefCell<HashMap<Oid, CommitMetadata>>,
    pub picks: RefCell<HashMap<Oid, PickOutcome>>,
    pub continue_outcomes: RefCell<HashMap<Oid, PickOutcome>>,
    pub failing_picks: RefCell<HashSet<Oid>>,
    pub picking: RefCell<Option<Oid>>,
    pub in_progress: RefCell<Option<InProgressOp>>,
    pub is_clean: RefCell<bool>,
    pub stash: RefCell<Option<StashHandle>>,
    pub stash_pop_result: RefCell<StashPop>,
    pub push_outcome: RefCell<PushOutcome>,
    pub identity: RefCell<Option<Identity>>,
    pub reflogs: RefCell<HashMap<String, Vec<ReflogEntry>>>,
    pub calls: RefCell<Vec<String>>,
    next_id: Cell<u8>,
}

impl Default for MockGitOps {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitOps {
    pub fn new() -> Self {
        Self {
            current_branch: RefCell::new(None),
            detached_head: RefCell::new(None),
            branches: RefCell::new(HashMap::new()),
            remote_branches: RefCell::new(HashMap::new()),
            remote_default: RefCell::new(None),
            range: RefCell::new(Vec::new()),
            metadata: RefCell::new(HashMap::new()),
            picks: RefCell::new(HashMap::new()),
            continue_outcomes: RefCell::new(HashMap::new()),
            failing_picks: RefCell::new(HashSet::new()),
            picking: RefCell::new(None),
            in_progress: RefCell::new(None),
            is_clean: RefCell::new(true),
            stash: RefCell::new(None),
            stash_pop_result: RefCell::new(StashPop::Restored),
            push_outcome: RefCell::new(PushOutcome::Pushed),
            identity: RefCell::new(Some(Identity {
                name: "Test User".into(),
                email: "test@example.com".into(),
            })),
            reflogs: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(100),
        }
    }

    /// A repository with `main` at 1, `local_commit` at 2 and the given queue,
    /// checked out on `local_commit`.
    pub fn with_queue(queue: &[Oid]) -> Self {
        let repo = Self::new()
            .with_branch("main", oid(1))
            .with_branch("local_commit", oid(2))
            .with_current_branch("local_commit");
        *repo.range.borrow_mut() = queue.to_vec();
        repo
    }

    pub fn with_branch(self, name: &str, id: Oid) -> Self {
        self.branches.borrow_mut().insert(name.to_string(), id);
        self
    }

    pub fn with_remote_branch(self, name: &str, id: Oid) -> Self {
        self.remote_branches.borrow_mut().insert(name.to_string(), id);
        self
    }

    pub fn with_remote_default(self, name: &str) -> Self {
        *self.remote_default.borrow_mut() = Some(name.to_string());
        self
    }

    pub fn with_current_branch(self, name: &str) -> Self {
        *self.current_branch.borrow_mut() = Some(name.to_string());
        self
    }

    pub fn with_head(self, id: Oid) -> Self {
        *self.detached_head.borrow_mut() = Some(id);
        self
    }

    pub fn with_clean(self, clean: bool) -> Self {
        *self.is_clean.borrow_mut() = clean;
        self
    }

    pub fn with_pick(self, commit: Oid, outcome: PickOutcome) -> Self {
        self.picks.borrow_mut().insert(commit, outcome);
        self
    }

    pub fn with_continue(self, commit: Oid, outcome: PickOutcome) -> Self {
        self.continue_outcomes.borrow_mut().insert(commit, outcome);
        self
    }

    pub fn with_failing_pick(self, commit: Oid) -> Self {
        self.failing_picks.borrow_mut().insert(commit);
        self
    }

    pub fn with_identity(self, name: &str, email: &str) -> Self {
        *self.identity.borrow_mut() = Some(Identity {
            name: name.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub fn without_identity(self) -> Self {
        *self.identity.borrow_mut() = None;
        self
    }

    pub fn with_push_outcome(self, outcome: PushOutcome) -> Self {
        *self.push_outcome.borrow_mut() = outcome;
        self
    }

    pub fn with_stash_pop_result(self, result: StashPop) -> Self {
        *self.stash_pop_result.borrow_mut() = result;
        self
    }

    pub fn with_reflog(self, branch: &str, entries: Vec<(Oid, &str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(id, message)| ReflogEntry {
                id,
                message: message.to_string(),
            })
            .collect();
        self.reflogs.borrow_mut().insert(branch.to_string(), entries);
        self
    }

    pub fn with_metadata(self, meta: CommitMetadata) -> Self {
        self.metadata.borrow_mut().insert(meta.id, meta);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn branch_tip(&self, name: &str) -> Option<Oid> {
        self.branches.borrow().get(name).copied()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn fresh_id(&self) -> Oid {
        let n = self.next_id.get();
        self.next_id.set(n.wrapping_add(1));
        oid(n)
    }

    fn advance_head(&self, id: Oid) {
        let current = self.current_branch.borrow().clone();
        match current {
            Some(branch) => {
                self.branches.borrow_mut().insert(branch, id);
            }
            None => *self.detached_head.borrow_mut() = Some(id),
        }
    }

    fn default_metadata(id: Oid) -> CommitMetadata {
        CommitMetadata {
            id,
            author_name: "Test User".into(),
            author_email: "test@example.com".into(),
            author_date: old_date(),
            committer_date: old_date(),
            message: format!("commit {}\n", ferry_git::short_id(id)),
        }
    }

    fn replayed(&self, source: Oid) -> Oid {
        let new_id = self.fresh_id();
        let mut meta = self
            .metadata
            .borrow()
            .get(&source)
            .cloned()
            .unwrap_or_else(|| Self::default_metadata(source));
        meta.id = new_id;
        self.metadata.borrow_mut().insert(new_id, meta);
        self.advance_head(new_id);
        new_id
    }

    fn resolve_rev(&self, rev: &str) -> Option<Oid> {
        if rev == "HEAD" {
            return self.head_commit().ok();
        }
        self.branches
            .borrow()
            .get(rev)
            .copied()
            .or_else(|| self.remote_branches.borrow().get(rev).copied())
            .or_else(|| Oid::from_str(rev).ok())
    }
}

impl GitOps for MockGitOps {
    fn workdir(&self) -> Option<&Path> {
        None
    }

    fn current_branch(&self) -> GitResult<Option<String>> {
        Ok(self.current_branch.borrow().clone())
    }

    fn head_commit(&self) -> GitResult<Oid> {
        let current = self.current_branch.borrow().clone();
        match current {
            Some(branch) => self.branch_commit(&branch),
            None => (*self.detached_head.borrow()).ok_or(ferry_git::Error::UnbornHead),
        }
    }

    fn in_progress_operation(&self) -> Option<InProgressOp> {
        *self.in_progress.borrow()
    }

    fn abort_in_progress(&self) -> GitResult<Option<InProgressOp>> {
        let op = self.in_progress.borrow_mut().take();
        if let Some(op) = op {
            self.record(format!("abort_in_progress {op}"));
            *self.picking.borrow_mut() = None;
        }
        Ok(op)
    }

    fn ref_exists(&self, name: &str, scope: RefScope) -> bool {
        match scope {
            RefScope::Local => self.branches.borrow().contains_key(name),
            RefScope::Remote => self.remote_branches.borrow().contains_key(name),
        }
    }

    fn create_branch(&self, name: &str, start_point: &str) -> GitResult<Oid> {
        let id = self
            .resolve_rev(start_point)
            .ok_or_else(|| ferry_git::Error::RefNotFound(start_point.to_string()))?;
        self.branches.borrow_mut().insert(name.to_string(), id);
        self.record(format!("create_branch {name} {start_point}"));
        Ok(id)
    }

    fn checkout(&self, name_or_ref: &str) -> GitResult<()> {
        if self.branches.borrow().contains_key(name_or_ref) {
            *self.current_branch.borrow_mut() = Some(name_or_ref.to_string());
        } else {
            let id = self
                .resolve_rev(name_or_ref)
                .ok_or_else(|| ferry_git::Error::RefNotFound(name_or_ref.to_string()))?;
            *self.current_branch.borrow_mut() = None;
            *self.detached_head.borrow_mut() = Some(id);
        }
        self.record(format!("checkout {name_or_ref}"));
        Ok(())
    }

    fn branch_commit(&self, branch: &str) -> GitResult<Oid> {
        self.branches
            .borrow()
            .get(branch)
            .copied()
            .ok_or_else(|| ferry_git::Error::BranchNotFound(branch.to_string()))
    }

    fn reset_branch(&self, branch: &str, commit: Oid) -> GitResult<()> {
        self.branches.borrow_mut().insert(branch.to_string(), commit);
        self.record(format!("reset_branch {branch} {}", ferry_git::short_id(commit)));
        Ok(())
    }

    fn branch_reflog(&self, branch: &str, limit: usize) -> GitResult<Vec<ReflogEntry>> {
        Ok(self
            .reflogs
            .borrow()
            .get(branch)
            .map(|entries| entries.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn commit_range(&self, _from: Oid, _to: Oid) -> GitResult<Vec<Oid>> {
        Ok(self.range.borrow().clone())
    }

    fn read_commit_metadata(&self, commit: Oid) -> GitResult<CommitMetadata> {
        Ok(self
            .metadata
            .borrow()
            .get(&commit)
            .cloned()
            .unwrap_or_else(|| Self::default_metadata(commit)))
    }

    fn cherry_pick(&self, commit: Oid) -> GitResult<PickOutcome> {
        self.record(format!("cherry_pick {}", ferry_git::short_id(commit)));
        if self.failing_picks.borrow().contains(&commit) {
            *self.in_progress.borrow_mut() = Some(InProgressOp::CherryPick);
            return Err(ferry_git::Error::MergeCommit(commit.to_string()));
        }

        let scripted = self.picks.borrow().get(&commit).cloned();
        match scripted {
            Some(PickOutcome::Conflict(files)) => {
                *self.in_progress.borrow_mut() = Some(InProgressOp::CherryPick);
                *self.picking.borrow_mut() = Some(commit);
                Ok(PickOutcome::Conflict(files))
            }
            Some(PickOutcome::Empty) => Ok(PickOutcome::Empty),
            Some(PickOutcome::Applied(_)) | None => Ok(PickOutcome::Applied(self.replayed(commit))),
        }
    }

    fn resolve_conflicts(&self, side: ConflictSide) -> GitResult<()> {
        if self.picking.borrow().is_none() {
            return Err(ferry_git::Error::NoCherryPick);
        }
        self.record(format!("resolve_conflicts {side}"));
        Ok(())
    }

    fn cherry_pick_continue(&self) -> GitResult<PickOutcome> {
        let commit = self
            .picking
            .borrow_mut()
            .take()
            .ok_or(ferry_git::Error::NoCherryPick)?;
        *self.in_progress.borrow_mut() = None;
        self.record("cherry_pick_continue");

        let scripted = self.continue_outcomes.borrow().get(&commit).cloned();
        match scripted {
            Some(PickOutcome::Empty) => Ok(PickOutcome::Empty),
            Some(PickOutcome::Conflict(files)) => {
                Err(ferry_git::Error::UnresolvedConflicts(files))
            }
            Some(PickOutcome::Applied(_)) | None => Ok(PickOutcome::Applied(self.replayed(commit))),
        }
    }

    fn cherry_pick_abort(&self) -> GitResult<()> {
        *self.picking.borrow_mut() = None;
        *self.in_progress.borrow_mut() = None;
        self.record("cherry_pick_abort");
        Ok(())
    }

    fn cherry_pick_skip(&self) -> GitResult<()> {
        *self.picking.borrow_mut() = None;
        *self.in_progress.borrow_mut() = None;
        self.record("cherry_pick_skip");
        Ok(())
    }

    fn amend_current(
        &self,
        author_time: &DateTime<FixedOffset>,
        committer_time: &DateTime<FixedOffset>,
        reset_author: bool,
    ) -> GitResult<Oid> {
        let identity = self.local_identity()?;
        let head = self.head_commit()?;
        let mut meta = self.read_commit_metadata(head)?;

        let new_id = self.fresh_id();
        meta.id = new_id;
        meta.author_date = *author_time;
        meta.committer_date = *committer_time;
        if reset_author {
            meta.author_name = identity.name;
            meta.author_email = identity.email;
        }
        self.metadata.borrow_mut().insert(new_id, meta);
        self.advance_head(new_id);
        self.record(format!("amend_current {}", ferry_git::short_id(head)));
        Ok(new_id)
    }

    fn is_clean(&self) -> GitResult<bool> {
        Ok(*self.is_clean.borrow())
    }

    fn stash_push(&self, label: &str) -> GitResult<Option<StashHandle>> {
        if *self.is_clean.borrow() {
            return Ok(None);
        }
        let handle = StashHandle {
            id: self.fresh_id(),
            label: label.to_string(),
        };
        *self.stash.borrow_mut() = Some(handle.clone());
        *self.is_clean.borrow_mut() = true;
        self.record(format!("stash_push {label}"));
        Ok(Some(handle))
    }

    fn stash_pop(&self, handle: &StashHandle) -> GitResult<StashPop> {
        self.record(format!("stash_pop {}", handle.label));
        let result = self.stash_pop_result.borrow().clone();
        if result == StashPop::Restored {
            *self.stash.borrow_mut() = None;
            *self.is_clean.borrow_mut() = false;
        }
        Ok(result)
    }

    fn push(&self, remote: &str, branch: &str) -> GitResult<PushOutcome> {
        self.record(format!("push {remote} {branch}"));
        Ok(self.push_outcome.borrow().clone())
    }

    fn remote_default_branch(&self, _remote: &str) -> Option<String> {
        self.remote_default.borrow().clone()
    }

    fn local_identity(&self) -> GitResult<Identity> {
        self.identity
            .borrow()
            .clone()
            .ok_or(ferry_git::Error::MissingIdentity)
    }
}

/// Prompt answering from a script.
pub struct ScriptedPrompt {
    pub conflict_choices: RefCell<Vec<ConflictChoice>>,
    pub step_answers: RefCell<Vec<bool>>,
    pub rewrite: bool,
    pub stash: bool,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self {
            conflict_choices: RefCell::new(Vec::new()),
            step_answers: RefCell::new(Vec::new()),
            rewrite: true,
            stash: true,
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn choosing(choices: &[ConflictChoice]) -> Self {
        let prompt = Self::new();
        *prompt.conflict_choices.borrow_mut() = choices.iter().rev().copied().collect();
        prompt
    }

    pub fn with_steps(self, answers: &[bool]) -> Self {
        *self.step_answers.borrow_mut() = answers.iter().rev().copied().collect();
        self
    }

    pub const fn declining_rewrite(mut self) -> Self {
        self.rewrite = false;
        self
    }

    pub const fn declining_stash(mut self) -> Self {
        self.stash = false;
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl MigrationPrompt for ScriptedPrompt {
    fn decide_conflict(&self, commit: &CommitMetadata, files: &[String]) -> ConflictChoice {
        self.asked.borrow_mut().push(format!(
            "conflict {} {}",
            ferry_git::short_id(commit.id),
            files.join(",")
        ));
        self.conflict_choices
            .borrow_mut()
            .pop()
            .unwrap_or(ConflictChoice::Abort)
    }

    fn confirm_commit(&self, commit: &CommitMetadata, position: usize, total: usize) -> bool {
        self.asked.borrow_mut().push(format!(
            "step {} {position}/{total}",
            ferry_git::short_id(commit.id)
        ));
        self.step_answers.borrow_mut().pop().unwrap_or(true)
    }
}

impl ReconcilePrompt for ScriptedPrompt {
    fn confirm_rewrite(&self, work: &str, remaining: usize) -> bool {
        self.asked
            .borrow_mut()
            .push(format!("rewrite {work} {remaining}"));
        self.rewrite
    }
}

impl StashPrompt for ScriptedPrompt {
    fn confirm_stash(&self, _branch: Option<&str>) -> bool {
        self.asked.borrow_mut().push("stash".into());
        self.stash
    }
}
