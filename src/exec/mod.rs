// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything that leaves the process goes through here: setup commands, the
//! generation step and the `git` invocations behind [`crate::publish::GitCli`].
//!
//! - [`command`] describes *what* to run (`CommandSpec`, `Invocation`).
//! - [`runner`] provides the `ProcessRunner` trait and the production
//!   `TokioProcessRunner`; tests substitute their own runner.

pub mod command;
pub mod runner;

use std::future::Future;
use std::pin::Pin;

pub use command::{CommandSpec, Invocation, OutputTarget, ProcessOutcome};
pub use runner::{ProcessRunner, TokioProcessRunner};

/// Boxed future returned by the object-safe traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
