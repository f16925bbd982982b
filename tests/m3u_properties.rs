// tests/m3u_properties.rs

use proptest::prelude::*;
use vodpublish::generate::{Catalog, parse_playlist, render_master};

const LOGO: &str = "https://via.placeholder.com/150";

fn title_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9éüñ ()]{1,20}".prop_map(|s| s.trim().to_string())
}

fn entry_strategy() -> impl Strategy<Value = (String, String, bool)> {
    (
        title_strategy(),
        "[a-z0-9]{1,12}",
        prop_oneof![Just(".mp4"), Just(".mkv"), Just(".MP4"), Just(".m3u8"), Just(".ts")],
    )
        .prop_map(|(title, stem, ext)| {
            let playable = matches!(ext, ".mp4" | ".mkv" | ".MP4");
            (title, format!("https://cdn.example.com/{stem}{ext}"), playable)
        })
}

proptest! {
    #[test]
    fn keeps_exactly_the_playable_entries_in_order(
        entries in proptest::collection::vec(entry_strategy(), 0..30)
    ) {
        let mut text = String::from("#EXTM3U\n");
        for (title, url, _) in entries.iter() {
            text.push_str(&format!("#EXTINF:-1 tvg-logo=\"https://img/x.png\",{title}\n{url}\n"));
        }

        let parsed = parse_playlist(&text, "Hollywood", LOGO);
        let expected: Vec<&String> = entries.iter().filter(|e| e.2).map(|e| &e.1).collect();
        let got: Vec<&String> = parsed.iter().map(|e| &e.url).collect();
        prop_assert_eq!(got, expected);

        for entry in parsed.iter() {
            prop_assert!(entry.title.is_ascii());
            prop_assert_eq!(entry.group.as_str(), "Hollywood");
            prop_assert_eq!(entry.logo.as_str(), "https://img/x.png");
        }
    }

    #[test]
    fn rendered_master_parses_back_to_the_same_urls(
        entries in proptest::collection::vec(entry_strategy(), 0..30)
    ) {
        let mut text = String::new();
        for (title, url, _) in entries.iter() {
            text.push_str(&format!("#EXTINF:-1,{title}\n{url}\n"));
        }
        let parsed = parse_playlist(&text, "G", LOGO);
        let catalog = Catalog::from_sources(&[parsed.clone()]);
        let rendered = render_master(catalog.records());

        prop_assert!(rendered.starts_with("#EXTM3U\n"));
        let reparsed = parse_playlist(&rendered, "G", LOGO);
        prop_assert_eq!(reparsed.len(), parsed.len());
        for (a, b) in reparsed.iter().zip(parsed.iter()) {
            prop_assert_eq!(&a.url, &b.url);
            prop_assert_eq!(&a.logo, &b.logo);
        }
    }
}
