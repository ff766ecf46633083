//! Configuration for the media fetcher.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp based fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Target audio format passed to `--audio-format`.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Target quality passed to `--audio-quality`.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// YouTube player clients, comma separated.
    #[serde(default = "default_player_clients")]
    pub player_clients: String,

    /// How many playlist members get full metadata in a preview.
    #[serde(default = "default_preview_count")]
    pub preview_count: usize,

    /// Verify TLS certificates of media hosts.
    #[serde(default)]
    pub check_certificates: bool,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

fn default_player_clients() -> String {
    "android,web".to_string()
}

fn default_preview_count() -> usize {
    3
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            player_clients: default_player_clients(),
            preview_count: default_preview_count(),
            check_certificates: false,
        }
    }
}

impl FetcherConfig {
    /// Sets the yt-dlp binary path.
    pub fn with_ytdlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ytdlp_path = path.into();
        self
    }
}
