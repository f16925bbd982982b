use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use vodpublish::config::CheckoutSettings;
use vodpublish::errors::{PublishError, Result};
use vodpublish::exec::BoxFuture;
use vodpublish::publish::Vcs;
use vodpublish::types::CommitIdentity;

/// Everything the fake was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Clone { remote: String, depth: u32 },
    EnsureWorkTree,
    Stage(Vec<PathBuf>),
    HasStagedChanges,
    Commit { identity: CommitIdentity, message: String },
    Push,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<VcsCall>,
    push_failures_left: u32,
    /// Files present in the work dir when `stage` was called.
    tree_at_stage: Vec<PathBuf>,
}

/// A fake `Vcs` that records calls and fails `push` a configured number of
/// times before succeeding.
#[derive(Clone)]
pub struct FakeVcs {
    work_dir: PathBuf,
    changes: bool,
    tracked: Vec<PathBuf>,
    state: Arc<Mutex<State>>,
}

impl FakeVcs {
    /// `changes` is what `has_staged_changes` reports.
    pub fn new(work_dir: impl AsRef<Path>, changes: bool) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            changes,
            tracked: Vec::new(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Paths `tracked` reports as present in the index.
    pub fn with_tracked(mut self, paths: &[&str]) -> Self {
        self.tracked = paths.iter().map(PathBuf::from).collect();
        self
    }

    pub fn failing_pushes(self, n: u32) -> Self {
        self.state.lock().unwrap().push_failures_left = n;
        self
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn commits(&self) -> Vec<VcsCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, VcsCall::Commit { .. }))
            .collect()
    }

    pub fn push_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == VcsCall::Push).count()
    }

    pub fn tree_at_stage(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().tree_at_stage.clone()
    }

    fn record(&self, call: VcsCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl Vcs for FakeVcs {
    fn clone_shallow<'a>(&'a self, checkout: &'a CheckoutSettings) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(VcsCall::Clone {
                remote: checkout.remote.clone(),
                depth: checkout.depth,
            });
            std::fs::create_dir_all(&self.work_dir)?;
            Ok(())
        })
    }

    fn ensure_work_tree(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.record(VcsCall::EnsureWorkTree);
            Ok(())
        })
    }

    fn stage<'a>(&'a self, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut tree: Vec<PathBuf> = std::fs::read_dir(&self.work_dir)?
                .filter_map(|e| e.ok())
                .map(|e| PathBuf::from(e.file_name()))
                .collect();
            tree.sort();
            let mut state = self.state.lock().unwrap();
            state.tree_at_stage = tree;
            state.calls.push(VcsCall::Stage(paths.to_vec()));
            Ok(())
        })
    }

    fn tracked<'a>(&'a self, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<Vec<PathBuf>>> {
        Box::pin(async move {
            Ok(paths
                .iter()
                .filter(|p| self.tracked.contains(p))
                .cloned()
                .collect())
        })
    }

    fn has_staged_changes(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            self.record(VcsCall::HasStagedChanges);
            Ok(self.changes)
        })
    }

    fn commit<'a>(
        &'a self,
        identity: &'a CommitIdentity,
        message: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(VcsCall::Commit {
                identity: identity.clone(),
                message: message.to_string(),
            });
            Ok(())
        })
    }

    fn push(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.calls.push(VcsCall::Push);
            if state.push_failures_left > 0 {
                state.push_failures_left -= 1;
                return Err(PublishError::VcsError(
                    "! [rejected] main -> main (fetch first)".to_string(),
                ));
            }
            Ok(())
        })
    }
}
