// src/exec/command.rs

use std::fmt;
use std::path::{Path, PathBuf};

/// A command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// Run through the platform shell (`sh -c` / `cmd /C`).
    Shell(String),

    /// Run a program directly with an argument vector.
    Exec { program: PathBuf, args: Vec<String> },
}

impl CommandSpec {
    pub fn exec<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::Exec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSpec::Shell(cmd) => f.write_str(cmd),
            CommandSpec::Exec { program, args } => {
                write!(f, "{}", program.display())?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
        }
    }
}

/// Where a child's stdout and stderr go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Share the parent's stdout/stderr.
    Inherit,

    /// Collect both streams into [`ProcessOutcome`].
    Capture,

    /// Truncate the file and send both streams into it.
    File(PathBuf),
}

/// One process execution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: CommandSpec,
    pub cwd: PathBuf,
    pub output: OutputTarget,
}

impl Invocation {
    pub fn new(command: CommandSpec, cwd: impl AsRef<Path>, output: OutputTarget) -> Self {
        Self {
            command,
            cwd: cwd.as_ref().to_path_buf(),
            output,
        }
    }
}

/// Result of a finished process.
///
/// `code` is `None` when the process was terminated by a signal.
/// `stdout`/`stderr` are only populated for [`OutputTarget::Capture`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}
