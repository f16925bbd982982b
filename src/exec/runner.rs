// src/exec/runner.rs

//! Individual process runner.

use std::fs::File;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

use super::BoxFuture;
use super::command::{CommandSpec, Invocation, OutputTarget, ProcessOutcome};

/// Trait abstracting how processes are started.
///
/// Production code uses [`TokioProcessRunner`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessRunner: Send + Sync {
    /// Run the invocation to completion.
    ///
    /// A non-zero exit is *not* an error; only failing to spawn or wait is.
    fn run(&self, invocation: Invocation) -> BoxFuture<'_, Result<ProcessOutcome>>;
}

/// Runs processes with `tokio::process::Command`.
///
/// Children are killed when the returned future is dropped, which is how the
/// run-level timeout terminates a hung generator.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    fn run(&self, invocation: Invocation) -> BoxFuture<'_, Result<ProcessOutcome>> {
        Box::pin(run_invocation(invocation))
    }
}

fn build_command(spec: &CommandSpec) -> Command {
    match spec {
        CommandSpec::Shell(cmd) => {
            // Build a shell command appropriate for the platform.
            if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(cmd);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(cmd);
                c
            }
        }
        CommandSpec::Exec { program, args } => {
            let mut c = Command::new(program);
            c.args(args);
            c
        }
    }
}

async fn run_invocation(invocation: Invocation) -> Result<ProcessOutcome> {
    let Invocation {
        command,
        cwd,
        output,
    } = invocation;

    debug!(cmd = %command, cwd = ?cwd, "starting process");

    let mut cmd = build_command(&command);
    cmd.current_dir(&cwd).stdin(Stdio::null()).kill_on_drop(true);

    match output {
        OutputTarget::Capture => {
            let out = cmd
                .output()
                .await
                .with_context(|| format!("running '{command}'"))?;
            let outcome = ProcessOutcome {
                code: out.status.code(),
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            };
            debug!(cmd = %command, exit_code = ?outcome.code, "process exited");
            Ok(outcome)
        }
        OutputTarget::Inherit => {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            wait_for(cmd, &command).await
        }
        OutputTarget::File(path) => {
            let file = File::create(&path)
                .with_context(|| format!("creating output file {:?}", path))?;
            let err_file = file
                .try_clone()
                .with_context(|| format!("duplicating handle for {:?}", path))?;
            cmd.stdout(Stdio::from(file)).stderr(Stdio::from(err_file));
            wait_for(cmd, &command).await
        }
    }
}

async fn wait_for(mut cmd: Command, command: &CommandSpec) -> Result<ProcessOutcome> {
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process '{command}'"))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process '{command}'"))?;

    info!(
        cmd = %command,
        exit_code = ?status.code(),
        success = status.success(),
        "process exited"
    );

    Ok(ProcessOutcome {
        code: status.code(),
        ..ProcessOutcome::default()
    })
}
