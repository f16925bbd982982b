// src/generate/metadata.rs

//! The `video_metadata.json` catalog.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::m3u::VideoEntry;

/// One catalog entry as persisted in the metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub url: String,
    pub title: String,
    pub logo: String,
    pub group: String,
    pub source: String,
}

/// Videos keyed by `video_<source>_<entry>`, in playlist order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    videos: IndexMap<String, VideoRecord>,
}

impl Catalog {
    /// Build the catalog from per-source entry lists.
    ///
    /// Position in `sources` determines the source number, so a source that
    /// failed to fetch should still be passed (as an empty list) to keep the
    /// numbering of later sources stable.
    pub fn from_sources(sources: &[Vec<VideoEntry>]) -> Self {
        let mut videos = IndexMap::new();
        for (source_idx, entries) in sources.iter().enumerate() {
            for (idx, entry) in entries.iter().enumerate() {
                let id = format!("video_{}_{}", source_idx + 1, idx + 1);
                videos.insert(
                    id,
                    VideoRecord {
                        url: entry.url.clone(),
                        title: entry.title.clone(),
                        logo: entry.logo.clone(),
                        group: entry.group.clone(),
                        source: format!("source_{}", source_idx + 1),
                    },
                );
            }
        }
        Self { videos }
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.videos.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &VideoRecord> {
        self.videos.values()
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
