//! Mock media fetcher for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{
    FetchError, FetchOutput, FetchTarget, MediaFetcher, MediaInfo, MediaKind,
};
use crate::job::JobControl;

/// Mock implementation of the MediaFetcher trait.
///
/// Writes small placeholder `.mp3` files instead of running yt-dlp:
/// - Track every download target for assertions
/// - Fail a configurable number of leading single downloads
/// - Write a configurable set of playlist files, optionally reporting an error
/// - Hold a download open until it is cancelled, like a long yt-dlp run
///
/// # Example
///
/// ```rust,ignore
/// use tempofetch_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new();
/// fetcher.set_playlist_files(vec!["a.mp3".into(), "b.mp3".into()]).await;
/// fetcher.set_failing_attempts(1).await;
///
/// // ... run a job ...
///
/// assert_eq!(fetcher.fetch_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    /// Targets passed to `fetch_audio`, in call order.
    targets: Arc<RwLock<Vec<FetchTarget>>>,
    /// Number of `fetch_playlist_audio` calls.
    playlist_calls: Arc<RwLock<usize>>,
    /// How many of the next single downloads fail.
    failing_attempts: Arc<RwLock<usize>>,
    /// Stderr reported by a failing single download.
    failure_diagnostic: Arc<RwLock<String>>,
    /// File written by a successful single download.
    single_file: Arc<RwLock<String>>,
    /// Files written by a playlist download.
    playlist_files: Arc<RwLock<Vec<String>>>,
    /// Error returned after the playlist files were written.
    playlist_error: Arc<RwLock<Option<String>>>,
    /// Simulated run time of every download; cut short by cancellation.
    download_delay: Arc<RwLock<Option<Duration>>>,
    /// Preview returned by `fetch_metadata`.
    metadata: Arc<RwLock<Option<MediaInfo>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self {
            targets: Arc::new(RwLock::new(Vec::new())),
            playlist_calls: Arc::new(RwLock::new(0)),
            failing_attempts: Arc::new(RwLock::new(0)),
            failure_diagnostic: Arc::new(RwLock::new(
                "ERROR: mock download failure".to_string(),
            )),
            single_file: Arc::new(RwLock::new("Mock Song.mp3".to_string())),
            playlist_files: Arc::new(RwLock::new(Vec::new())),
            playlist_error: Arc::new(RwLock::new(None)),
            download_delay: Arc::new(RwLock::new(None)),
            metadata: Arc::new(RwLock::new(None)),
        }
    }

    /// Targets of all single downloads so far.
    pub async fn recorded_targets(&self) -> Vec<FetchTarget> {
        self.targets.read().await.clone()
    }

    /// Number of single downloads attempted.
    pub async fn fetch_count(&self) -> usize {
        self.targets.read().await.len()
    }

    /// Number of playlist downloads attempted.
    pub async fn playlist_count(&self) -> usize {
        *self.playlist_calls.read().await
    }

    /// Make the next `count` single downloads fail.
    pub async fn set_failing_attempts(&self, count: usize) {
        *self.failing_attempts.write().await = count;
    }

    /// Set the stderr a failing single download reports.
    pub async fn set_failure_diagnostic(&self, diagnostic: impl Into<String>) {
        *self.failure_diagnostic.write().await = diagnostic.into();
    }

    /// Set the file name a single download produces.
    pub async fn set_single_file(&self, name: impl Into<String>) {
        *self.single_file.write().await = name.into();
    }

    /// Set the files a playlist download produces.
    pub async fn set_playlist_files(&self, names: Vec<String>) {
        *self.playlist_files.write().await = names;
    }

    /// Make playlist downloads fail with `message` after writing their files.
    pub async fn set_playlist_error(&self, message: impl Into<String>) {
        *self.playlist_error.write().await = Some(message.into());
    }

    /// Make every download take `delay` unless cancelled first.
    pub async fn set_download_delay(&self, delay: Duration) {
        *self.download_delay.write().await = Some(delay);
    }

    /// Set the preview returned for any URL.
    pub async fn set_metadata(&self, info: MediaInfo) {
        *self.metadata.write().await = Some(info);
    }

    /// Sleeps for the configured delay, returning early on cancellation.
    async fn simulate_run(&self, control: &JobControl) -> Result<(), FetchError> {
        if control.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let delay = *self.download_delay.read().await;
        if let Some(delay) = delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = control.token().cancelled() => return Err(FetchError::Cancelled),
            }
        }
        Ok(())
    }

    async fn take_failure(&self) -> bool {
        let mut remaining = self.failing_attempts.write().await;
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }

    fn default_metadata(url: &str) -> MediaInfo {
        MediaInfo {
            kind: MediaKind::Video,
            title: format!("Mock video for {}", url),
            duration: 180,
            thumbnail: "https://example.com/thumb.jpg".to_string(),
            uploader: Some("Mock Uploader".to_string()),
            count: None,
            videos: Vec::new(),
            member_ids: Vec::new(),
        }
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MediaInfo, FetchError> {
        if let Some(info) = self.metadata.read().await.as_ref() {
            return Ok(info.clone());
        }
        Ok(Self::default_metadata(url))
    }

    async fn fetch_audio(
        &self,
        target: &FetchTarget,
        dest_dir: &Path,
        control: &JobControl,
    ) -> Result<FetchOutput, FetchError> {
        self.targets.write().await.push(target.clone());
        self.simulate_run(control).await?;

        if self.take_failure().await {
            return Err(FetchError::ToolFailed {
                context: "Download failed".to_string(),
                diagnostic: self.failure_diagnostic.read().await.clone(),
            });
        }

        let path = dest_dir.join(self.single_file.read().await.as_str());
        tokio::fs::write(&path, b"mock audio").await?;

        Ok(FetchOutput {
            reported_path: target.reports_path().then_some(path),
        })
    }

    async fn fetch_playlist_audio(
        &self,
        _url: &str,
        dest_dir: &Path,
        control: &JobControl,
    ) -> Result<(), FetchError> {
        *self.playlist_calls.write().await += 1;
        self.simulate_run(control).await?;

        for name in self.playlist_files.read().await.iter() {
            tokio::fs::write(dest_dir.join(name), b"mock audio").await?;
        }

        match self.playlist_error.read().await.as_ref() {
            Some(message) => Err(FetchError::ToolFailed {
                context: "Playlist download error".to_string(),
                diagnostic: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn validate(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
