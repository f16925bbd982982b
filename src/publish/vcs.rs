// src/publish/vcs.rs

//! Version-control seam.
//!
//! The publisher only needs a handful of operations on one working tree.
//! [`GitCli`] implements them by shelling out to `git` through a
//! [`ProcessRunner`]; tests substitute a recording fake.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::CheckoutSettings;
use crate::errors::{PublishError, Result};
use crate::exec::{BoxFuture, CommandSpec, Invocation, OutputTarget, ProcessOutcome, ProcessRunner};
use crate::types::CommitIdentity;

pub trait Vcs: Send + Sync {
    /// Clone `checkout.remote` with history truncated to `checkout.depth`
    /// into the working tree directory, which must not exist yet.
    fn clone_shallow<'a>(&'a self, checkout: &'a CheckoutSettings) -> BoxFuture<'a, Result<()>>;

    /// Fail unless the working tree directory is a git checkout.
    fn ensure_work_tree(&self) -> BoxFuture<'_, Result<()>>;

    /// Stage exactly `paths` (relative to the working tree), including
    /// deletions and new files under them.
    fn stage<'a>(&'a self, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<()>>;

    /// The subset of `paths` that has entries in the index, either as a
    /// tracked file or as a directory holding tracked files.
    fn tracked<'a>(&'a self, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<Vec<PathBuf>>>;

    /// Whether the index differs from `HEAD`.
    fn has_staged_changes(&self) -> BoxFuture<'_, Result<bool>>;

    fn commit<'a>(
        &'a self,
        identity: &'a CommitIdentity,
        message: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    /// Push the checked-out branch to its upstream. No rebase is attempted.
    fn push(&self) -> BoxFuture<'_, Result<()>>;
}

/// `git` command-line implementation of [`Vcs`].
pub struct GitCli {
    runner: Arc<dyn ProcessRunner>,
    work_dir: PathBuf,
}

impl GitCli {
    pub fn new(runner: Arc<dyn ProcessRunner>, work_dir: impl AsRef<Path>) -> Self {
        Self {
            runner,
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    async fn git(&self, cwd: &Path, args: Vec<String>) -> Result<ProcessOutcome> {
        let invocation = Invocation::new(CommandSpec::exec("git", args), cwd, OutputTarget::Capture);
        let outcome = self.runner.run(invocation).await?;
        debug!(exit_code = ?outcome.code, stderr = %outcome.stderr.trim(), "git finished");
        Ok(outcome)
    }

    async fn git_ok(&self, cwd: &Path, args: Vec<String>) -> Result<ProcessOutcome> {
        let what = args.first().cloned().unwrap_or_default();
        let outcome = self.git(cwd, args).await?;
        if outcome.success() {
            Ok(outcome)
        } else {
            Err(PublishError::VcsError(format!(
                "git {what} exited with {:?}: {}",
                outcome.code,
                outcome.stderr.trim()
            )))
        }
    }
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

impl Vcs for GitCli {
    fn clone_shallow<'a>(&'a self, checkout: &'a CheckoutSettings) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut args = strings(["clone", "--depth"]);
            args.push(checkout.depth.to_string());
            if let Some(branch) = &checkout.branch {
                args.push("--branch".to_string());
                args.push(branch.clone());
            }
            args.push(checkout.remote.clone());
            args.push(self.work_dir.display().to_string());

            self.git_ok(Path::new("."), args).await?;
            Ok(())
        })
    }

    fn ensure_work_tree(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let outcome = self
                .git(&self.work_dir, strings(["rev-parse", "--is-inside-work-tree"]))
                .await?;
            if outcome.success() && outcome.stdout.trim() == "true" {
                Ok(())
            } else {
                Err(PublishError::VcsError(format!(
                    "{:?} is not a git working tree; set [checkout].remote to clone one",
                    self.work_dir
                )))
            }
        })
    }

    fn stage<'a>(&'a self, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut args = strings(["add", "-A", "--"]);
            args.extend(paths.iter().map(|p| p.display().to_string()));
            self.git_ok(&self.work_dir, args).await?;
            Ok(())
        })
    }

    fn tracked<'a>(&'a self, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<Vec<PathBuf>>> {
        Box::pin(async move {
            let mut args = strings(["ls-files", "-z", "--"]);
            args.extend(paths.iter().map(|p| p.display().to_string()));
            let outcome = self.git_ok(&self.work_dir, args).await?;
            let listed: Vec<&Path> = outcome
                .stdout
                .split('\0')
                .filter(|entry| !entry.is_empty())
                .map(Path::new)
                .collect();
            Ok(paths
                .iter()
                .filter(|p| listed.iter().any(|entry| entry.starts_with(p)))
                .cloned()
                .collect())
        })
    }

    fn has_staged_changes(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            let outcome = self
                .git(&self.work_dir, strings(["diff", "--cached", "--quiet"]))
                .await?;
            match outcome.code {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                other => Err(PublishError::VcsError(format!(
                    "git diff exited with {other:?}: {}",
                    outcome.stderr.trim()
                ))),
            }
        })
    }

    fn commit<'a>(
        &'a self,
        identity: &'a CommitIdentity,
        message: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let args = vec![
                "-c".to_string(),
                format!("user.name={}", identity.name),
                "-c".to_string(),
                format!("user.email={}", identity.email),
                "-c".to_string(),
                "commit.gpgsign=false".to_string(),
                "commit".to_string(),
                "-m".to_string(),
                message.to_string(),
            ];
            // Leading `-c` flags would make `git_ok` report the wrong subcommand.
            let outcome = self.git(&self.work_dir, args).await?;
            if !outcome.success() {
                return Err(PublishError::VcsError(format!(
                    "git commit exited with {:?}: {}",
                    outcome.code,
                    outcome.stderr.trim()
                )));
            }
            Ok(())
        })
    }

    fn push(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.git_ok(&self.work_dir, strings(["push"])).await?;
            Ok(())
        })
    }
}
