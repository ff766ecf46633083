//! yt-dlp based fetcher implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::MediaFetcher;
use super::types::{FetchOutput, FetchTarget, MediaInfo, MediaKind, PlaylistMember};
use super::url::{is_playlist_url, watch_url};
use crate::job::JobControl;
use crate::process::{run_tool, ToolOutput};

/// Fields of `--dump-json` output we care about.
#[derive(Debug, Deserialize)]
struct RawVideo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
}

/// One line of a flat playlist listing.
#[derive(Debug, Deserialize)]
struct RawPlaylistEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    playlist_title: Option<String>,
    #[serde(default)]
    playlist: Option<String>,
}

/// yt-dlp based fetcher implementation.
pub struct YtDlpFetcher {
    config: FetcherConfig,
}

impl YtDlpFetcher {
    /// Creates a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FetcherConfig::default())
    }

    fn extractor_args(&self) -> [String; 2] {
        [
            "--extractor-args".to_string(),
            format!("youtube:player_client={}", self.config.player_clients),
        ]
    }

    /// Output template plus the audio extraction flags shared by single and
    /// playlist downloads.
    fn audio_args(&self, dest_dir: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-o".to_string(),
            dest_dir
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .to_string(),
            "--write-thumbnail".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            self.config.audio_quality.clone(),
            "--embed-thumbnail".to_string(),
            "--add-metadata".to_string(),
        ]
    }

    /// Builds yt-dlp arguments for a single-item download.
    fn build_download_args(&self, target: &FetchTarget, dest_dir: &Path) -> Vec<String> {
        let mut args = self.audio_args(dest_dir);
        args.push("--no-playlist".to_string());
        args.extend(self.extractor_args());
        if !self.config.check_certificates {
            args.push("--no-check-certificate".to_string());
        }
        if target.reports_path() {
            args.extend(["--print".to_string(), "after_move:filepath".to_string()]);
        }
        args.push(target.as_arg());
        args
    }

    /// Builds yt-dlp arguments for a whole-playlist download.
    fn build_playlist_args(&self, url: &str, dest_dir: &Path) -> Vec<String> {
        let mut args = vec!["--yes-playlist".to_string()];
        args.extend(self.audio_args(dest_dir));
        args.extend([
            "--ignore-errors".to_string(),
            "--no-playlist-reverse".to_string(),
        ]);
        args.extend(self.extractor_args());
        if !self.config.check_certificates {
            args.push("--no-check-certificate".to_string());
        }
        args.push(url.to_string());
        args
    }

    fn build_video_info_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
        ];
        args.extend(self.extractor_args());
        args.push(url.to_string());
        args
    }

    fn build_playlist_listing_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--yes-playlist".to_string(),
            "--flat-playlist".to_string(),
            "--print-json".to_string(),
            "--no-warnings".to_string(),
            "--skip-download".to_string(),
        ];
        args.extend(self.extractor_args());
        args.push(url.to_string());
        args
    }

    fn build_playlist_ids_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--yes-playlist".to_string(),
            "--flat-playlist".to_string(),
            "--get-id".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.extractor_args());
        args.push(url.to_string());
        args
    }

    /// Picks the first printed line that names an MP3 inside `dest_dir`.
    fn parse_reported_path(stdout: &str, dest_dir: &Path) -> Option<PathBuf> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| line.to_lowercase().ends_with(".mp3"))
            .map(PathBuf::from)
            .find(|path| path.starts_with(dest_dir))
    }

    fn parse_video_info(output: &str) -> Result<MediaInfo, FetchError> {
        let output = output.trim();
        if output.is_empty() {
            return Err(FetchError::parse("yt-dlp returned empty output"));
        }
        let raw: RawVideo =
            serde_json::from_str(output).map_err(|e| FetchError::parse(e.to_string()))?;

        Ok(MediaInfo {
            kind: MediaKind::Video,
            title: raw.title.unwrap_or_default(),
            duration: raw.duration.map(|d| d as u64).unwrap_or(0),
            thumbnail: raw.thumbnail.unwrap_or_default(),
            uploader: raw.uploader,
            count: None,
            videos: Vec::new(),
            member_ids: Vec::new(),
        })
    }

    /// Parses line-delimited JSON from a flat playlist listing into member
    /// ids and the playlist title. Unparsable lines are skipped.
    fn parse_playlist_listing(output: &str) -> (Vec<String>, Option<String>) {
        let mut ids = Vec::new();
        let mut title: Option<String> = None;

        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let entry: RawPlaylistEntry = match serde_json::from_str(line) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unparsable playlist line: {}", e);
                    continue;
                }
            };
            if let Some(id) = entry.id.filter(|id| !id.is_empty()) {
                ids.push(id);
            }
            if title.is_none() {
                title = entry
                    .playlist_title
                    .filter(|t| !t.is_empty())
                    .or(entry.playlist.filter(|t| !t.is_empty()));
            }
        }

        (ids, title)
    }

    fn parse_id_lines(output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Runs yt-dlp outside of any job, for previews.
    async fn run_detached(
        &self,
        args: Vec<String>,
        context: &str,
    ) -> Result<ToolOutput, FetchError> {
        let mut command = Command::new(&self.config.ytdlp_path);
        command.args(args);
        let control = JobControl::detached(CancellationToken::new());
        run_tool(command, &control)
            .await
            .map_err(|e| FetchError::from_tool(e, &self.config.ytdlp_path, context))
    }

    async fn fetch_video_info(&self, url: &str) -> Result<MediaInfo, FetchError> {
        let output = self
            .run_detached(self.build_video_info_args(url), "Failed to get video info")
            .await?;
        Self::parse_video_info(&output.stdout_lossy())
    }

    async fn fetch_playlist_info(&self, url: &str) -> Result<MediaInfo, FetchError> {
        let output = self
            .run_detached(
                self.build_playlist_listing_args(url),
                "Failed to get playlist info",
            )
            .await?;
        let (mut ids, playlist_title) = Self::parse_playlist_listing(&output.stdout_lossy());

        if ids.is_empty() {
            info!("No videos found with --print-json, trying --get-id");
            let output = self
                .run_detached(
                    self.build_playlist_ids_args(url),
                    "Failed to get playlist IDs",
                )
                .await?;
            ids = Self::parse_id_lines(&output.stdout_lossy());
        }

        if ids.is_empty() {
            return Err(FetchError::EmptyPlaylist);
        }
        info!("Found {} videos in playlist", ids.len());

        let mut videos = Vec::new();
        for id in ids.iter().take(self.config.preview_count) {
            match self.fetch_video_info(&watch_url(id)).await {
                Ok(info) => videos.push(PlaylistMember {
                    id: id.clone(),
                    title: info.title,
                    duration: info.duration,
                    thumbnail: info.thumbnail,
                    url: watch_url(id),
                }),
                Err(e) => warn!("Skipping preview of playlist member {}: {}", id, e),
            }
        }

        let title =
            playlist_title.unwrap_or_else(|| format!("Playlist ({} videos)", ids.len()));
        let thumbnail = videos
            .first()
            .map(|v| v.thumbnail.clone())
            .unwrap_or_default();

        Ok(MediaInfo {
            kind: MediaKind::Playlist,
            title,
            duration: 0,
            thumbnail,
            uploader: None,
            count: Some(ids.len()),
            videos,
            member_ids: ids,
        })
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MediaInfo, FetchError> {
        if is_playlist_url(url) {
            self.fetch_playlist_info(url).await
        } else {
            self.fetch_video_info(url).await
        }
    }

    async fn fetch_audio(
        &self,
        target: &FetchTarget,
        dest_dir: &Path,
        control: &JobControl,
    ) -> Result<FetchOutput, FetchError> {
        let args = self.build_download_args(target, dest_dir);
        debug!(
            job_id = %control.job_id(),
            strategy = target.strategy(),
            "yt-dlp {}",
            args.join(" ")
        );

        let mut command = Command::new(&self.config.ytdlp_path);
        command.args(args);
        let output = run_tool(command, control)
            .await
            .map_err(|e| FetchError::from_tool(e, &self.config.ytdlp_path, "Download failed"))?;

        Ok(FetchOutput {
            reported_path: Self::parse_reported_path(&output.stdout_lossy(), dest_dir),
        })
    }

    async fn fetch_playlist_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        control: &JobControl,
    ) -> Result<(), FetchError> {
        let args = self.build_playlist_args(url, dest_dir);
        debug!(job_id = %control.job_id(), "yt-dlp {}", args.join(" "));

        let mut command = Command::new(&self.config.ytdlp_path);
        command.args(args);
        run_tool(command, control).await.map_err(|e| {
            FetchError::from_tool(e, &self.config.ytdlp_path, "Playlist download error")
        })?;
        Ok(())
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let result = Command::new(&self.config.ytdlp_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::YtDlpNotFound {
                path: self.config.ytdlp_path.clone(),
            }),
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}
