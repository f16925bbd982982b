// src/publish/artifact.rs

//! Local artifact store for run diagnostics.
//!
//! Layout: `<root>/<name>/<timestamp>/{<file>, manifest.json}`. Each upload
//! carries an expiry; expired uploads of the same name are pruned whenever a
//! new one is stored.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;

const MANIFEST: &str = "manifest.json";

/// Description of one stored artifact, persisted as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub blake3: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl AsRef<Path>) -> Self {
        Self {
            fs,
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Store a copy of `source` under `name`, retained for `retention`.
    ///
    /// Returns `Ok(None)` when `source` does not exist.
    pub fn upload(
        &self,
        name: &str,
        source: &Path,
        retention: Duration,
    ) -> Result<Option<ArtifactRecord>> {
        self.upload_at(name, source, retention, Utc::now())
    }

    pub fn upload_at(
        &self,
        name: &str,
        source: &Path,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<ArtifactRecord>> {
        if !self.fs.exists(source) {
            warn!(path = ?source, artifact = name, "no file found to upload");
            return Ok(None);
        }

        match self.prune_expired(name, now) {
            Ok(0) => {}
            Ok(pruned) => info!(artifact = name, pruned, "removed expired artifacts"),
            Err(e) => warn!(artifact = name, error = %format!("{e:#}"), "pruning expired artifacts failed"),
        }

        let contents = self.fs.read(source)?;
        let file_name = source
            .file_name()
            .ok_or_else(|| anyhow!("artifact source {:?} has no file name", source))?;

        let dir = self.fresh_upload_dir(name, now);
        let stored = dir.join(file_name);
        self.fs.write(&stored, &contents)?;

        let retention = TimeDelta::from_std(retention)
            .with_context(|| format!("retention {retention:?} is out of range"))?;
        let record = ArtifactRecord {
            name: name.to_string(),
            path: stored,
            size: contents.len() as u64,
            blake3: blake3::hash(&contents).to_hex().to_string(),
            created_at: now,
            expires_at: now + retention,
        };

        let manifest = serde_json::to_vec_pretty(&record).context("encoding artifact manifest")?;
        self.fs.write(&dir.join(MANIFEST), &manifest)?;

        info!(
            artifact = name,
            path = ?record.path,
            size = record.size,
            expires_at = %record.expires_at,
            "uploaded artifact"
        );
        Ok(Some(record))
    }

    /// Every stored upload of `name`, oldest first.
    pub fn list(&self, name: &str) -> Result<Vec<ArtifactRecord>> {
        let base = self.root.join(name);
        if !self.fs.is_dir(&base) {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for dir in self.fs.read_dir(&base)? {
            let manifest = dir.join(MANIFEST);
            if !self.fs.exists(&manifest) {
                debug!(path = ?dir, "skipping artifact dir without manifest");
                continue;
            }
            let text = self.fs.read_to_string(&manifest)?;
            match serde_json::from_str::<ArtifactRecord>(&text) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = ?manifest, error = %e, "skipping unreadable artifact manifest"),
            }
        }
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    /// Remove uploads of `name` whose expiry is at or before `now`.
    pub fn prune_expired(&self, name: &str, now: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for record in self.list(name)? {
            if record.expires_at > now {
                continue;
            }
            if let Some(dir) = record.path.parent() {
                if self.fs.remove_dir_all(dir)? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn fresh_upload_dir(&self, name: &str, now: DateTime<Utc>) -> PathBuf {
        let stamp = now.format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let base = self.root.join(name);
        let mut dir = base.join(&stamp);
        let mut n = 1;
        while self.fs.exists(&dir) {
            dir = base.join(format!("{stamp}-{n}"));
            n += 1;
        }
        dir
    }
}
