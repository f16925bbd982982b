// src/generate/m3u.rs

//! M3U playlist parsing and rendering.
//!
//! Only the subset of extended M3U the upstream collections use is handled:
//! `#EXTINF` entries with an optional `tvg-logo` attribute, and `#EXTGRP`
//! group markers that apply to every following entry.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::metadata::VideoRecord;

static LOGO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"tvg-logo\s*=\s*"([^"]+)""#).expect("tvg-logo pattern is valid")
});

const PLAYABLE_EXTENSIONS: [&str; 2] = [".mp4", ".mkv"];

/// One playable entry extracted from a source playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    pub url: String,
    /// ASCII transliteration of the `#EXTINF` title.
    pub title: String,
    pub logo: String,
    pub group: String,
}

/// Extract playable entries from playlist text.
///
/// `initial_group` applies until the playlist declares `#EXTGRP:<name>`. An
/// `#EXTGRP` with a blank name leaves the current group in place.
/// Entries whose URL is not an `.mp4`/`.mkv` file are dropped with a warning.
pub fn parse_playlist(content: &str, initial_group: &str, default_logo: &str) -> Vec<VideoEntry> {
    let lines: Vec<&str> = content.lines().collect();
    let mut entries = Vec::new();
    let mut group = initial_group.to_string();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.starts_with("#EXTGRP") {
            if let Some((_, name)) = line.split_once(':') {
                let name = name.trim();
                if !name.is_empty() {
                    group = name.to_string();
                }
            }
        } else if line.starts_with("#EXTINF") {
            let raw_title = match line.split_once(',') {
                Some((_, t)) => t.trim().to_string(),
                None => format!("Video_{}", entries.len() + 1),
            };
            let logo = LOGO_RE
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| default_logo.to_string());

            // The URL line is consumed only when it is one; a directive right
            // after `#EXTINF` gets its own turn through the loop.
            if let Some(next) = lines.get(i + 1) {
                let url = next.trim();
                if !url.is_empty() && !url.starts_with('#') {
                    i += 1;
                    if is_playable(url) {
                        entries.push(VideoEntry {
                            url: url.to_string(),
                            title: unidecode::unidecode(&raw_title),
                            logo,
                            group: group.clone(),
                        });
                    } else {
                        warn!(url, "skipping unsupported URL");
                    }
                }
            }
        }

        i += 1;
    }

    entries
}

fn is_playable(url: &str) -> bool {
    let lower = url.to_lowercase();
    PLAYABLE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Render the master playlist for the given records, in order.
pub fn render_master<'a>(records: impl IntoIterator<Item = &'a VideoRecord>) -> String {
    let mut out = String::from("#EXTM3U\n");
    for video in records {
        out.push_str(&format!(
            "#EXTINF:-1 tvg-logo=\"{}\" group-title=\"{}\",{}\n{}\n",
            video.logo, video.group, video.title, video.url
        ));
    }
    out
}
