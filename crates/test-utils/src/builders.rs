#![allow(dead_code)]

use std::path::{Path, PathBuf};

use vodpublish::config::{ConfigFile, RawConfigFile, SourceConfig};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults with a zero push delay so retry tests
/// don't sleep.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.git.push_retry_delay = "0ms".to_string();
        Self { config }
    }

    pub fn work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.publish.work_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn artifact_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.artifact.dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn remote(mut self, remote: &str) -> Self {
        self.config.checkout.remote = Some(remote.to_string());
        self
    }

    pub fn setup(mut self, cmd: &str) -> Self {
        self.config.setup.commands.push(cmd.to_string());
        self
    }

    pub fn generate_command(mut self, cmd: &str) -> Self {
        self.config.generate.command = Some(cmd.to_string());
        self
    }

    pub fn source(mut self, url: &str, group: Option<&str>) -> Self {
        self.config.generate.sources.push(SourceConfig {
            url: url.to_string(),
            group: group.map(str::to_string),
        });
        self
    }

    pub fn clear_sources(mut self) -> Self {
        self.config.generate.sources.clear();
        self
    }

    pub fn staged_paths(mut self, paths: &[&str]) -> Self {
        self.config.git.paths = paths.iter().map(PathBuf::from).collect();
        self
    }

    pub fn push_attempts(mut self, n: u32) -> Self {
        self.config.git.push_attempts = n;
        self
    }

    pub fn push_retry_delay(mut self, d: &str) -> Self {
        self.config.git.push_retry_delay = d.to_string();
        self
    }

    pub fn timeout(mut self, d: &str) -> Self {
        self.config.publish.timeout = d.to_string();
        self
    }

    pub fn raw(&self) -> &RawConfigFile {
        &self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
