// src/config/validate.rs

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::model::{
    ArtifactSettings, CheckoutSettings, ConfigFile, GenerateSettings, GitSettings,
    PublishSettings, RawConfigFile,
};
use crate::errors::{PublishError, Result};
use crate::schedule::parse_schedule;
use crate::types::{CommitIdentity, parse_duration};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PublishError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let publish = PublishSettings {
            run_timeout: duration_field("[publish].timeout", &raw.publish.timeout)?,
            schedule: raw.publish.schedule,
            work_dir: raw.publish.work_dir,
        };

        let checkout = raw.checkout.remote.map(|remote| CheckoutSettings {
            remote,
            branch: raw.checkout.branch,
            depth: raw.checkout.depth,
        });

        let generate = GenerateSettings {
            fetch_timeout: duration_field("[generate].fetch_timeout", &raw.generate.fetch_timeout)?,
            command: raw.generate.command,
            log_file: raw.generate.log_file,
            master_playlist: raw.generate.master_playlist,
            metadata_file: raw.generate.metadata_file,
            permanent_dir: raw.generate.permanent_dir,
            sources: raw.generate.sources,
            user_agent: raw.generate.user_agent,
            default_logo: raw.generate.default_logo,
        };

        let artifact = ArtifactSettings {
            retention: duration_field("[artifact].retention", &raw.artifact.retention)?,
            name: raw.artifact.name,
            dir: raw.artifact.dir,
        };

        let git = GitSettings {
            push_retry_delay: duration_field("[git].push_retry_delay", &raw.git.push_retry_delay)?,
            identity: CommitIdentity {
                name: raw.git.author_name,
                email: raw.git.author_email,
            },
            message: raw.git.message,
            paths: raw.git.paths,
            push_attempts: raw.git.push_attempts,
        };

        Ok(ConfigFile {
            publish,
            checkout,
            setup: raw.setup.commands,
            generate,
            artifact,
            git,
        })
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_schedule(cfg)?;
    validate_checkout(cfg)?;
    validate_generate(cfg)?;
    validate_artifact(cfg)?;
    validate_git(cfg)?;
    ensure_log_never_staged(cfg)?;
    Ok(())
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| PublishError::ConfigError(format!("{field} = {value:?}: {e}")))
}

fn validate_schedule(cfg: &RawConfigFile) -> Result<()> {
    parse_schedule(&cfg.publish.schedule)?;
    if duration_field("[publish].timeout", &cfg.publish.timeout)?.is_zero() {
        return Err(PublishError::ConfigError(
            "[publish].timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_checkout(cfg: &RawConfigFile) -> Result<()> {
    if cfg.checkout.remote.is_some() && cfg.checkout.depth == 0 {
        return Err(PublishError::ConfigError(
            "[checkout].depth must be >= 1 (got 0)".to_string(),
        ));
    }
    // A configured remote means the work dir is wiped and re-cloned.
    if cfg.checkout.remote.is_some() && contains_current_dir(&cfg.publish.work_dir)? {
        return Err(PublishError::ConfigError(format!(
            "[publish].work_dir {:?} contains the current directory; it must name a dedicated \
             directory when [checkout].remote is set",
            cfg.publish.work_dir
        )));
    }
    if cfg.checkout.remote.is_none() && cfg.checkout.branch.is_some() {
        return Err(PublishError::ConfigError(
            "[checkout].branch requires [checkout].remote".to_string(),
        ));
    }
    Ok(())
}

fn validate_generate(cfg: &RawConfigFile) -> Result<()> {
    let generate = &cfg.generate;

    if generate.command.is_none() && generate.sources.is_empty() {
        return Err(PublishError::ConfigError(
            "the built-in generator needs at least one [[generate.sources]] entry".to_string(),
        ));
    }

    if let Some(cmd) = &generate.command {
        if cmd.trim().is_empty() {
            return Err(PublishError::ConfigError(
                "[generate].command must not be empty".to_string(),
            ));
        }
    }

    for source in generate.sources.iter() {
        if !(source.url.starts_with("http://") || source.url.starts_with("https://")) {
            return Err(PublishError::ConfigError(format!(
                "source url '{}' must be http(s)",
                source.url
            )));
        }
    }

    duration_field("[generate].fetch_timeout", &generate.fetch_timeout)?;
    Ok(())
}

fn validate_artifact(cfg: &RawConfigFile) -> Result<()> {
    let name = &cfg.artifact.name;
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(PublishError::ConfigError(format!(
            "[artifact].name '{name}' must be a plain, non-empty file name"
        )));
    }
    duration_field("[artifact].retention", &cfg.artifact.retention)?;
    Ok(())
}

fn validate_git(cfg: &RawConfigFile) -> Result<()> {
    if cfg.git.push_attempts == 0 {
        return Err(PublishError::ConfigError(
            "[git].push_attempts must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.git.paths.is_empty() {
        return Err(PublishError::ConfigError(
            "[git].paths must list at least one path".to_string(),
        ));
    }
    if cfg.git.message.trim().is_empty() {
        return Err(PublishError::ConfigError(
            "[git].message must not be empty".to_string(),
        ));
    }
    duration_field("[git].push_retry_delay", &cfg.git.push_retry_delay)?;
    Ok(())
}

/// The generation log is deleted before staging, but listing it (or a parent
/// directory of it) would still be a mistake worth rejecting up front.
fn ensure_log_never_staged(cfg: &RawConfigFile) -> Result<()> {
    let log = normalize(&cfg.generate.log_file);
    for path in cfg.git.paths.iter() {
        let staged = normalize(path);
        if staged.as_os_str().is_empty() || log.starts_with(&staged) {
            return Err(PublishError::ConfigError(format!(
                "[git].paths entry {:?} would stage the generation log {:?}",
                path, cfg.generate.log_file
            )));
        }
    }
    Ok(())
}

/// Whether `work_dir` resolves to the current directory or one of its
/// ancestors.
fn contains_current_dir(work_dir: &Path) -> Result<bool> {
    let cwd = std::env::current_dir()?.canonicalize()?;
    let joined = cwd.join(work_dir);
    let resolved = joined
        .canonicalize()
        .unwrap_or_else(|_| resolve_lexically(&joined));
    Ok(cwd.starts_with(&resolved))
}

fn resolve_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::model::SourceConfig;

    #[test]
    fn defaults_validate() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.git.push_attempts, 3);
        assert_eq!(cfg.git.push_retry_delay, Duration::from_secs(5));
        assert_eq!(cfg.publish.run_timeout, Duration::from_secs(600));
        assert_eq!(cfg.artifact.retention, Duration::from_secs(86_400));
        assert_eq!(cfg.git.identity.to_string(), "GitHub Action <action@github.com>");
        assert!(cfg.checkout.is_none());
    }

    #[test]
    fn rejects_staging_the_log() {
        let mut raw = RawConfigFile::default();
        raw.git.paths.push(PathBuf::from("./generate.log"));
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, PublishError::ConfigError(msg) if msg.contains("generation log")));
    }

    #[test]
    fn rejects_staging_the_whole_tree() {
        let mut raw = RawConfigFile::default();
        raw.git.paths = vec![PathBuf::from(".")];
        assert!(ConfigFile::try_from(raw).is_err());
    }

    fn with_remote(work_dir: impl Into<PathBuf>) -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        raw.checkout.remote = Some("https://github.com/acme/vod.git".to_string());
        raw.publish.work_dir = work_dir.into();
        raw
    }

    #[test]
    fn remote_checkout_never_wipes_the_current_directory() {
        let cwd = std::env::current_dir().unwrap();
        for work_dir in [
            PathBuf::from("."),
            PathBuf::from(".."),
            PathBuf::from("checkout/.."),
            cwd.clone(),
            cwd.parent().unwrap().to_path_buf(),
        ] {
            let err = ConfigFile::try_from(with_remote(work_dir.clone())).unwrap_err();
            assert!(
                matches!(&err, PublishError::ConfigError(msg) if msg.contains("work_dir")),
                "{work_dir:?} was accepted"
            );
        }

        assert!(ConfigFile::try_from(with_remote("checkout")).is_ok());
        assert!(ConfigFile::try_from(with_remote(cwd.join("target/vod-checkout"))).is_ok());
    }

    #[test]
    fn rejects_zero_push_attempts() {
        let mut raw = RawConfigFile::default();
        raw.git.push_attempts = 0;
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn builtin_generator_needs_sources() {
        let mut raw = RawConfigFile::default();
        raw.generate.sources.clear();
        assert!(ConfigFile::try_from(raw.clone()).is_err());

        raw.generate.command = Some("python3 VOD-generate_m3u.py".to_string());
        assert!(ConfigFile::try_from(raw).is_ok());
    }

    #[test]
    fn rejects_non_http_sources() {
        let mut raw = RawConfigFile::default();
        raw.generate.sources = vec![SourceConfig {
            url: "file:///etc/passwd".to_string(),
            group: None,
        }];
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn rejects_bad_durations_and_schedule() {
        let mut raw = RawConfigFile::default();
        raw.git.push_retry_delay = "soon".to_string();
        assert!(ConfigFile::try_from(raw).is_err());

        let mut raw = RawConfigFile::default();
        raw.publish.schedule = "every twelve hours".to_string();
        assert!(ConfigFile::try_from(raw).is_err());
    }
}
