// src/publish/pipeline.rs

//! Ordered steps of one publish run.
//!
//! checkout → setup → generate (log to file) → upload log (always) →
//! delete log → stage known paths → commit if changed → push with retry.
//!
//! Generation failing still uploads the log, then stops before staging.
//! Push failures are retried a fixed number of times; exhausting them is
//! reported in [`RunReport`] rather than as an `Err`, so the caller still
//! sees which artifact was uploaded.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{PublishError, Result};
use crate::exec::{CommandSpec, Invocation, OutputTarget, ProcessRunner};
use crate::fs::FileSystem;

use super::artifact::{ArtifactRecord, LocalArtifactStore};
use super::report::{CommitOutcome, GenerationOutcome, PushOutcome, RunReport};
use super::retry::FixedDelay;
use super::vcs::Vcs;

pub struct Publisher {
    config: ConfigFile,
    generate_command: CommandSpec,
    runner: Arc<dyn ProcessRunner>,
    vcs: Arc<dyn Vcs>,
    fs: Arc<dyn FileSystem>,
    artifacts: LocalArtifactStore,
}

impl Publisher {
    pub fn new(
        config: ConfigFile,
        generate_command: CommandSpec,
        runner: Arc<dyn ProcessRunner>,
        vcs: Arc<dyn Vcs>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let artifacts = LocalArtifactStore::new(Arc::clone(&fs), &config.artifact.dir);
        Self {
            config,
            generate_command,
            runner,
            vcs,
            fs,
            artifacts,
        }
    }

    pub fn artifacts(&self) -> &LocalArtifactStore {
        &self.artifacts
    }

    /// Run once under the configured wall-clock limit.
    ///
    /// The limit is enforced per step against a single deadline. A step that
    /// overruns it is dropped, which kills any child process it was waiting
    /// on. The generation log is still uploaded and removed when generation
    /// is the step that overran.
    pub async fn run(&self) -> Result<RunReport> {
        let deadline = Instant::now() + self.config.publish.run_timeout;
        self.run_until(Some(deadline)).await
    }

    /// Run once with no time limit.
    pub async fn run_once(&self) -> Result<RunReport> {
        self.run_until(None).await
    }

    async fn run_until(&self, deadline: Option<Instant>) -> Result<RunReport> {
        let work_dir = self.config.publish.work_dir.clone();

        self.within(deadline, self.checkout(&work_dir)).await??;
        self.within(deadline, self.run_setup(&work_dir)).await??;

        let log_path = work_dir.join(&self.config.generate.log_file);
        let generation = self
            .within(deadline, self.generate(&work_dir, &log_path))
            .await;
        let artifact = self.upload_log(&log_path);
        self.remove_log(&log_path)?;
        let generation = generation?;

        if generation != GenerationOutcome::Succeeded {
            warn!("generation failed; skipping commit and push");
            return Ok(RunReport {
                generation,
                artifact,
                staged: Vec::new(),
                commit: CommitOutcome::NotAttempted,
                push: PushOutcome::NotAttempted,
            });
        }

        let staged = self
            .within(deadline, self.stageable_paths(&work_dir))
            .await??;
        let commit = self.within(deadline, self.commit(&staged)).await??;
        let push = match commit {
            CommitOutcome::Committed => self.within(deadline, self.push()).await?,
            _ => PushOutcome::NotAttempted,
        };

        Ok(RunReport {
            generation,
            artifact,
            staged,
            commit,
            push,
        })
    }

    async fn within<F: Future>(&self, deadline: Option<Instant>, step: F) -> Result<F::Output> {
        let Some(deadline) = deadline else {
            return Ok(step.await);
        };
        match tokio::time::timeout_at(deadline, step).await {
            Ok(out) => Ok(out),
            Err(_) => {
                let limit = self.config.publish.run_timeout;
                error!(limit_secs = limit.as_secs(), "publish run timed out");
                Err(PublishError::Timeout(limit))
            }
        }
    }

    async fn checkout(&self, work_dir: &Path) -> Result<()> {
        match &self.config.checkout {
            Some(checkout) => {
                if self.fs.remove_dir_all(work_dir)? {
                    debug!(path = ?work_dir, "removed stale checkout");
                }
                info!(remote = %checkout.remote, depth = checkout.depth, path = ?work_dir, "cloning");
                self.vcs.clone_shallow(checkout).await
            }
            None => self.vcs.ensure_work_tree().await,
        }
    }

    async fn run_setup(&self, work_dir: &Path) -> Result<()> {
        for command in self.config.setup.iter() {
            info!(cmd = %command, "running setup command");
            let outcome = self
                .runner
                .run(Invocation::new(
                    CommandSpec::Shell(command.clone()),
                    work_dir,
                    OutputTarget::Inherit,
                ))
                .await?;
            if !outcome.success() {
                return Err(PublishError::SetupFailed {
                    command: command.clone(),
                    code: outcome.code,
                });
            }
        }
        Ok(())
    }

    async fn generate(&self, work_dir: &Path, log_path: &Path) -> GenerationOutcome {
        info!(cmd = %self.generate_command, log = ?log_path, "running generation step");
        let invocation = Invocation::new(
            self.generate_command.clone(),
            work_dir,
            OutputTarget::File(log_path.to_path_buf()),
        );

        match self.runner.run(invocation).await {
            Ok(outcome) if outcome.success() => GenerationOutcome::Succeeded,
            Ok(outcome) => {
                error!(exit_code = ?outcome.code, "generation step failed");
                GenerationOutcome::Failed {
                    exit_code: outcome.code,
                }
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "generation step could not run");
                GenerationOutcome::Failed { exit_code: None }
            }
        }
    }

    /// Upload problems are logged and never fail the run.
    fn upload_log(&self, log_path: &Path) -> Option<ArtifactRecord> {
        let artifact = &self.config.artifact;
        match self
            .artifacts
            .upload(&artifact.name, log_path, artifact.retention)
        {
            Ok(record) => record,
            Err(e) => {
                warn!(artifact = %artifact.name, error = %format!("{e:#}"), "log upload failed");
                None
            }
        }
    }

    fn remove_log(&self, log_path: &Path) -> Result<()> {
        if self.fs.remove_file(log_path)? {
            debug!(path = ?log_path, "removed generation log from working tree");
        }
        Ok(())
    }

    /// Configured paths that exist in the tree or are tracked by git. A
    /// tracked path that generation removed is kept so its deletion is
    /// staged.
    async fn stageable_paths(&self, work_dir: &Path) -> Result<Vec<PathBuf>> {
        let tracked = self.vcs.tracked(&self.config.git.paths).await?;
        Ok(self
            .config
            .git
            .paths
            .iter()
            .filter(|p| {
                let present = self.fs.exists(&work_dir.join(p)) || tracked.contains(p);
                if !present {
                    debug!(path = ?p, "not staging missing untracked path");
                }
                present
            })
            .cloned()
            .collect())
    }

    async fn commit(&self, staged: &[PathBuf]) -> Result<CommitOutcome> {
        if staged.is_empty() {
            info!("no artifact paths present; nothing to commit");
            return Ok(CommitOutcome::NothingToCommit);
        }

        self.vcs.stage(staged).await?;
        if !self.vcs.has_staged_changes().await? {
            info!("artifacts unchanged; nothing to commit");
            return Ok(CommitOutcome::NothingToCommit);
        }

        let git = &self.config.git;
        self.vcs.commit(&git.identity, &git.message).await?;
        info!(author = %git.identity, message = %git.message, "committed artifact changes");
        Ok(CommitOutcome::Committed)
    }

    async fn push(&self) -> PushOutcome {
        let git = &self.config.git;
        let policy = FixedDelay::new(git.push_attempts, git.push_retry_delay);

        match policy.run("push", |_| self.vcs.push()).await {
            Ok(((), attempts)) => {
                info!(attempts, "pushed");
                PushOutcome::Pushed { attempts }
            }
            Err(exhausted) => {
                error!(
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "push failed on every attempt"
                );
                PushOutcome::Exhausted {
                    attempts: exhausted.attempts,
                    last_error: exhausted.last_error.to_string(),
                }
            }
        }
    }
}
