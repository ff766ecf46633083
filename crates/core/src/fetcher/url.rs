//! URL classification shared by preview and download.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static VIDEO_ID: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?:[?&]v=|youtu\.be/|/shorts/|/embed/|/live/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .ok()
});

const PLAYLIST_PREFIXES: [&str; 4] = [
    "https://www.youtube.com/playlist",
    "http://www.youtube.com/playlist",
    "https://youtube.com/playlist",
    "http://youtube.com/playlist",
];

/// Whether `url` addresses a playlist rather than a single video.
///
/// A `list=` parameter wins even when a video id is present too, so
/// `watch?v=...&list=...` is treated as a playlist.
pub fn is_playlist_url(url: &str) -> bool {
    url.contains("list=")
        || url.contains("/playlist")
        || PLAYLIST_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
}

/// Extracts the 11 character YouTube video id from common URL shapes.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .as_ref()?
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
