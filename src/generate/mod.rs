// src/generate/mod.rs

//! Built-in generation step.
//!
//! Fetches every configured source playlist, keeps the `.mp4`/`.mkv`
//! entries, and writes the master playlist plus the metadata catalog into
//! the working directory. Per-source fetch failures are logged and skipped;
//! only a run where *every* source fails is an error, so an outage upstream
//! never replaces a good playlist with an empty one.

pub mod fetch;
pub mod m3u;
pub mod metadata;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use crate::config::GenerateSettings;
use crate::errors::GenerateError;
use crate::fs::FileSystem;

pub use fetch::{HttpFetcher, PlaylistFetcher};
pub use m3u::{VideoEntry, parse_playlist, render_master};
pub use metadata::{Catalog, VideoRecord};

const FALLBACK_GROUP: &str = "Unknown";

/// What a successful generation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub videos: usize,
    pub failed_sources: usize,
    pub master_playlist: PathBuf,
    pub metadata_file: PathBuf,
}

pub struct Generator<F> {
    fetcher: F,
    fs: Arc<dyn FileSystem>,
    settings: GenerateSettings,
    root: PathBuf,
}

impl<F: PlaylistFetcher> Generator<F> {
    /// Output paths in `settings` are resolved against `root`.
    pub fn new(
        fetcher: F,
        fs: Arc<dyn FileSystem>,
        settings: GenerateSettings,
        root: impl AsRef<Path>,
    ) -> Self {
        Self {
            fetcher,
            fs,
            settings,
            root: root.as_ref().to_path_buf(),
        }
    }

    pub async fn run(&self) -> Result<GenerationSummary, GenerateError> {
        let permanent_dir = self.root.join(&self.settings.permanent_dir);
        self.fs
            .create_dir_all(&permanent_dir)
            .map_err(|e| write_error(&permanent_dir, e))?;
        info!(path = ?permanent_dir, "ensured permanent playlist directory");

        let mut per_source = Vec::with_capacity(self.settings.sources.len());
        let mut failed = 0;

        for source in self.settings.sources.iter() {
            let group = source.group.as_deref().unwrap_or(FALLBACK_GROUP);
            match self.fetcher.fetch(&source.url).await {
                Ok(text) => {
                    let entries = parse_playlist(&text, group, &self.settings.default_logo);
                    info!(url = %source.url, count = entries.len(), "parsed source playlist");
                    per_source.push(entries);
                }
                Err(e) => {
                    error!(error = %e, "source playlist unavailable");
                    failed += 1;
                    per_source.push(Vec::new());
                }
            }
        }

        if failed == self.settings.sources.len() {
            return Err(GenerateError::AllSourcesFailed(failed));
        }

        let catalog = Catalog::from_sources(&per_source);

        let master = self.root.join(&self.settings.master_playlist);
        self.fs
            .write(&master, render_master(catalog.records()).as_bytes())
            .map_err(|e| write_error(&master, e))?;
        info!(path = ?master, videos = catalog.len(), "wrote master playlist");

        let metadata = self.root.join(&self.settings.metadata_file);
        self.fs
            .write(&metadata, catalog.to_json()?.as_bytes())
            .map_err(|e| write_error(&metadata, e))?;
        info!(path = ?metadata, "saved video metadata");

        Ok(GenerationSummary {
            videos: catalog.len(),
            failed_sources: failed,
            master_playlist: master,
            metadata_file: metadata,
        })
    }
}

fn write_error(path: &Path, err: anyhow::Error) -> GenerateError {
    GenerateError::Write {
        path: path.display().to_string(),
        reason: format!("{err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{ConfigFile, RawConfigFile, SourceConfig};
    use crate::exec::BoxFuture;
    use crate::fs::mock::MockFileSystem;

    struct StaticFetcher(HashMap<String, String>);

    impl PlaylistFetcher for StaticFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, GenerateError>> {
            let res = self.0.get(url).cloned().ok_or_else(|| GenerateError::Fetch {
                url: url.to_string(),
                reason: "404".to_string(),
            });
            Box::pin(async move { res })
        }
    }

    fn settings(urls: &[&str]) -> GenerateSettings {
        let mut raw = RawConfigFile::default();
        raw.generate.sources = urls
            .iter()
            .map(|u| SourceConfig {
                url: u.to_string(),
                group: None,
            })
            .collect();
        ConfigFile::try_from(raw).unwrap().generate
    }

    #[tokio::test]
    async fn failed_source_keeps_numbering_of_later_sources() {
        let fs = MockFileSystem::new();
        let fetcher = StaticFetcher(HashMap::from([(
            "https://b/list.m3u".to_string(),
            "#EXTINF:-1,B\nhttps://b/b.mp4\n".to_string(),
        )]));
        let generator = Generator::new(
            fetcher,
            Arc::new(fs.clone()),
            settings(&["https://a/list.m3u", "https://b/list.m3u"]),
            "work",
        );

        let summary = generator.run().await.unwrap();
        assert_eq!(summary.videos, 1);
        assert_eq!(summary.failed_sources, 1);

        let json = fs
            .read_to_string(Path::new("work/video_metadata.json"))
            .unwrap();
        let catalog: Catalog = serde_json::from_str(&json).unwrap();
        let record = catalog.get("video_2_1").unwrap();
        assert_eq!(record.group, "Unknown");
        assert_eq!(record.source, "source_2");
        assert!(fs.is_dir(Path::new("work/m3u_permanent")));
    }

    #[tokio::test]
    async fn all_sources_failing_leaves_outputs_untouched() {
        let fs = MockFileSystem::new();
        fs.add_file("work/master.m3u", "#EXTM3U\nprevious\n");
        let generator = Generator::new(
            StaticFetcher(HashMap::new()),
            Arc::new(fs.clone()),
            settings(&["https://a/list.m3u"]),
            "work",
        );

        let err = generator.run().await.unwrap_err();
        assert!(matches!(err, GenerateError::AllSourcesFailed(1)));
        assert_eq!(
            fs.read_to_string(Path::new("work/master.m3u")).unwrap(),
            "#EXTM3U\nprevious\n"
        );
        assert!(!fs.exists(Path::new("work/video_metadata.json")));
    }
}
