//! Types for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::url::{extract_video_id, watch_url};

/// How a single download addresses its video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// A video id resolved from the submitted URL. yt-dlp is asked to print
    /// the final file path.
    Resolved(String),
    /// The URL exactly as submitted.
    FullUrl(String),
}

impl FetchTarget {
    /// The first attempt for `url`: its resolved id when one can be
    /// extracted, otherwise the URL itself.
    pub fn primary(url: &str) -> Self {
        match extract_video_id(url) {
            Some(id) => Self::Resolved(id),
            None => Self::FullUrl(url.to_string()),
        }
    }

    /// The retry for `url`, always addressed by the full URL.
    pub fn alternate(url: &str) -> Self {
        Self::FullUrl(url.to_string())
    }

    /// The argument handed to yt-dlp.
    pub fn as_arg(&self) -> String {
        match self {
            Self::Resolved(id) => watch_url(id),
            Self::FullUrl(url) => url.clone(),
        }
    }

    pub fn reports_path(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Label used in logs and metrics.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Resolved(_) => "resolved_id",
            Self::FullUrl(_) => "full_url",
        }
    }
}

/// Result of a single-item download.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutput {
    /// Final file path as printed by yt-dlp, when it printed one inside the
    /// destination directory.
    pub reported_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Playlist,
}

/// Preview metadata for a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    /// Seconds; 0 when unknown or for playlists.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    /// Number of playlist members.
    #[serde(default, rename = "video_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Preview of the first few playlist members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<PlaylistMember>,
    /// Ids of all playlist members.
    #[serde(skip)]
    pub member_ids: Vec<String>,
}

/// One previewed playlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistMember {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub url: String,
}
