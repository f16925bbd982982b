// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Setup command failed with exit code {code:?}: {command}")]
    SetupFailed { command: String, code: Option<i32> },

    #[error("Version control error: {0}")]
    VcsError(String),

    #[error("Run exceeded the {0:?} wall-clock limit")]
    Timeout(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised by the built-in playlist generator.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("fetching {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("all {0} playlist source(s) failed to fetch")]
    AllSourcesFailed(usize),

    #[error("writing {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("serializing metadata: {0}")]
    Json(#[from] serde_json::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PublishError>;
