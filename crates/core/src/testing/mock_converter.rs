//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{Artwork, Converter, ConverterError};
use crate::job::JobControl;

/// A recorded tempo change for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTempo {
    pub path: PathBuf,
    pub multiplier: f64,
    /// Whether the change succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track tempo changes for assertions
/// - Fail for specific file names
/// - Report and serve a fixed cover picture
/// - Simulate a slow transform that stops on cancellation
#[derive(Debug)]
pub struct MockConverter {
    /// Recorded tempo changes.
    recorded: Arc<RwLock<Vec<RecordedTempo>>>,
    /// File names whose transform fails.
    failing_files: Arc<RwLock<HashSet<String>>>,
    /// Cover picture reported for every file.
    artwork: Arc<RwLock<Option<Artwork>>>,
    /// Simulated transform duration.
    duration: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            recorded: Arc::new(RwLock::new(Vec::new())),
            failing_files: Arc::new(RwLock::new(HashSet::new())),
            artwork: Arc::new(RwLock::new(None)),
            duration: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded tempo changes.
    pub async fn recorded_tempos(&self) -> Vec<RecordedTempo> {
        self.recorded.read().await.clone()
    }

    /// Number of tempo changes attempted.
    pub async fn tempo_count(&self) -> usize {
        self.recorded.read().await.len()
    }

    /// Make the transform of `name` fail.
    pub async fn fail_for(&self, name: impl Into<String>) {
        self.failing_files.write().await.insert(name.into());
    }

    /// Report `artwork` as embedded in every file.
    pub async fn set_artwork(&self, artwork: Artwork) {
        *self.artwork.write().await = Some(artwork);
    }

    /// Set the simulated transform duration.
    pub async fn set_duration(&self, duration: Duration) {
        *self.duration.write().await = Some(duration);
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn apply_tempo(
        &self,
        path: &Path,
        multiplier: f64,
        control: &JobControl,
    ) -> Result<(), ConverterError> {
        if control.is_cancelled() {
            return Err(ConverterError::Cancelled);
        }

        let duration = *self.duration.read().await;
        if let Some(duration) = duration {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = control.token().cancelled() => return Err(ConverterError::Cancelled),
            }
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let fails = self.failing_files.read().await.contains(&name);

        self.recorded.write().await.push(RecordedTempo {
            path: path.to_path_buf(),
            multiplier,
            success: !fails,
        });

        if fails {
            return Err(ConverterError::conversion_failed(
                "ffmpeg exited with status 1",
                Some("mock tempo failure".to_string()),
            ));
        }
        Ok(())
    }

    async fn has_artwork(&self, _path: &Path) -> bool {
        self.artwork.read().await.is_some()
    }

    async fn extract_artwork(&self, path: &Path) -> Result<Artwork, ConverterError> {
        self.artwork
            .read()
            .await
            .clone()
            .ok_or_else(|| ConverterError::ArtworkNotFound {
                path: path.to_path_buf(),
            })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
