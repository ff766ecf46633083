//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use std::path::Path;

use super::error::FetchError;
use super::types::{FetchOutput, FetchTarget, MediaInfo};
use crate::job::JobControl;

/// Fetches metadata and audio from media URLs via an external tool.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Looks up title, duration and thumbnail for a video, or the member
    /// list and a short preview for a playlist.
    async fn fetch_metadata(&self, url: &str) -> Result<MediaInfo, FetchError>;

    /// Downloads one item as audio into `dest_dir`.
    async fn fetch_audio(
        &self,
        target: &FetchTarget,
        dest_dir: &Path,
        control: &JobControl,
    ) -> Result<FetchOutput, FetchError>;

    /// Downloads every item of a playlist into `dest_dir` in one run,
    /// skipping items that fail.
    async fn fetch_playlist_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        control: &JobControl,
    ) -> Result<(), FetchError>;

    /// Validates that the fetcher is properly configured and ready.
    async fn validate(&self) -> Result<(), FetchError>;
}
