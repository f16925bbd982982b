// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::CommitIdentity;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [publish]
/// schedule = "0 0 */12 * * *"
/// timeout = "10m"
///
/// [checkout]
/// remote = "https://github.com/acme/vod.git"
/// branch = "main"
///
/// [setup]
/// commands = ["pip install urllib3 unidecode"]
///
/// [generate]
/// log_file = "generate.log"
///
/// [[generate.sources]]
/// url = "https://example.com/Movies.m3u"
/// group = "Hollywood"
///
/// [git]
/// push_attempts = 3
/// push_retry_delay = "5s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub publish: PublishSection,

    #[serde(default)]
    pub checkout: CheckoutSection,

    #[serde(default)]
    pub setup: SetupSection,

    #[serde(default)]
    pub generate: GenerateSection,

    #[serde(default)]
    pub artifact: ArtifactSection,

    #[serde(default)]
    pub git: GitSection,
}

/// `[publish]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishSection {
    /// Cron expression with a seconds field, used by `daemon`.
    pub schedule: String,

    /// Wall-clock limit for a single run (e.g. `"10m"`).
    pub timeout: String,

    /// Directory the pipeline operates in. Relative to the process cwd.
    pub work_dir: PathBuf,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            schedule: "0 0 */12 * * *".to_string(),
            timeout: "10m".to_string(),
            work_dir: PathBuf::from("."),
        }
    }
}

/// `[checkout]` section.
///
/// With no `remote` the work dir must already be a git working tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckoutSection {
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub depth: u32,
}

impl Default for CheckoutSection {
    fn default() -> Self {
        Self {
            remote: None,
            branch: None,
            depth: 1,
        }
    }
}

/// `[setup]` section: shell commands run before generation.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SetupSection {
    pub commands: Vec<String>,
}

/// A playlist source fetched by the built-in generator.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,

    /// Group assigned to entries until the playlist declares `#EXTGRP`.
    #[serde(default)]
    pub group: Option<String>,
}

/// `[generate]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerateSection {
    /// Shell command to run instead of the built-in generator.
    pub command: Option<String>,

    pub log_file: PathBuf,
    pub master_playlist: PathBuf,
    pub metadata_file: PathBuf,
    pub permanent_dir: PathBuf,
    pub sources: Vec<SourceConfig>,
    pub fetch_timeout: String,
    pub user_agent: String,
    pub default_logo: String,
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self {
            command: None,
            log_file: PathBuf::from("generate.log"),
            master_playlist: PathBuf::from("master.m3u"),
            metadata_file: PathBuf::from("video_metadata.json"),
            permanent_dir: PathBuf::from("m3u_permanent"),
            sources: vec![
                SourceConfig {
                    url: "https://raw.githubusercontent.com/bugsfreeweb/LiveTVCollector/refs/heads/main/Movies/Hollywood/Movies.m3u".to_string(),
                    group: Some("Hollywood".to_string()),
                },
                SourceConfig {
                    url: "https://raw.githubusercontent.com/bugsfreeweb/LiveTVCollector/refs/heads/main/Movies/Worldwide/Movies.m3u".to_string(),
                    group: Some("Worldwide".to_string()),
                },
            ],
            fetch_timeout: "15s".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            default_logo: "https://via.placeholder.com/150".to_string(),
        }
    }
}

/// `[artifact]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactSection {
    pub name: String,
    pub dir: PathBuf,
    pub retention: String,
}

impl Default for ArtifactSection {
    fn default() -> Self {
        Self {
            name: "generate-log".to_string(),
            dir: PathBuf::from(".vodpublish/artifacts"),
            retention: "1d".to_string(),
        }
    }
}

/// `[git]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitSection {
    pub author_name: String,
    pub author_email: String,
    pub message: String,

    /// Paths staged after generation, relative to the work dir.
    pub paths: Vec<PathBuf>,

    /// Total push attempts, including the first.
    pub push_attempts: u32,
    pub push_retry_delay: String,
}

impl Default for GitSection {
    fn default() -> Self {
        Self {
            author_name: "GitHub Action".to_string(),
            author_email: "action@github.com".to_string(),
            message: "Update master M3U with raw URLs".to_string(),
            paths: vec![
                PathBuf::from("master.m3u"),
                PathBuf::from("m3u_permanent"),
                PathBuf::from("video_metadata.json"),
                PathBuf::from("Publisher.toml"),
            ],
            push_attempts: 3,
            push_retry_delay: "5s".to_string(),
        }
    }
}

/// Validated configuration.
///
/// Built from [`RawConfigFile`] through `TryFrom`, so durations, the cron
/// expression and path invariants are already checked.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub publish: PublishSettings,
    pub checkout: Option<CheckoutSettings>,
    pub setup: Vec<String>,
    pub generate: GenerateSettings,
    pub artifact: ArtifactSettings,
    pub git: GitSettings,
}

#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub schedule: String,
    pub run_timeout: Duration,
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub remote: String,
    pub branch: Option<String>,
    pub depth: u32,
}

#[derive(Debug, Clone)]
pub struct GenerateSettings {
    pub command: Option<String>,
    pub log_file: PathBuf,
    pub master_playlist: PathBuf,
    pub metadata_file: PathBuf,
    pub permanent_dir: PathBuf,
    pub sources: Vec<SourceConfig>,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub default_logo: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    pub name: String,
    pub dir: PathBuf,
    pub retention: Duration,
}

#[derive(Debug, Clone)]
pub struct GitSettings {
    pub identity: CommitIdentity,
    pub message: String,
    pub paths: Vec<PathBuf>,
    pub push_attempts: u32,
    pub push_retry_delay: Duration,
}
