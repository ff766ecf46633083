//! Job orchestrator: the single entry point the HTTP layer talks to.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::converter::{Artwork, Converter};
use crate::fetcher::{is_playlist_url, MediaFetcher, MediaInfo};
use crate::job::{Job, JobEvent, JobKind, JobRegistry, JobStatus};
use crate::metrics;
use crate::placer::{ArtifactLocation, FsPlacer, MoveReport, PlacerError};

use super::config::OrchestratorConfig;
use super::runner::JobRunner;
use super::types::{ArtifactInfo, ArtifactListing, OrchestratorError};

/// Accepts jobs, runs each one on its own task and answers queries about
/// jobs and stored artifacts.
///
/// Every job's cancellation token is a child of one root token, so
/// [`JobOrchestrator::shutdown`] stops all running work at once.
pub struct JobOrchestrator {
    config: OrchestratorConfig,
    registry: Arc<JobRegistry>,
    runner: JobRunner,
    fetcher: Arc<dyn MediaFetcher>,
    converter: Arc<dyn Converter>,
    placer: Arc<FsPlacer>,
    root: CancellationToken,
}

impl JobOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        fetcher: Arc<dyn MediaFetcher>,
        converter: Arc<dyn Converter>,
        placer: Arc<FsPlacer>,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new(config.event_buffer));
        let runner = JobRunner::new(
            config.clone(),
            Arc::clone(&registry),
            Arc::clone(&fetcher),
            Arc::clone(&converter),
            Arc::clone(&placer),
        );
        Self {
            config,
            registry,
            runner,
            fetcher,
            converter,
            placer,
            root: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn placer(&self) -> &Arc<FsPlacer> {
        &self.placer
    }

    /// Validates a request, registers a job and starts it in the background.
    ///
    /// A missing or zero speed means 1.0. Returns the job id immediately.
    pub async fn submit(&self, url: &str, speed: Option<f64>) -> Result<String, OrchestratorError> {
        let url = Self::require_url(url)?;
        let speed = self.normalize_speed(speed)?;
        let kind = if is_playlist_url(url) {
            JobKind::Playlist
        } else {
            JobKind::Single
        };

        let token = self.root.child_token();
        let job_id = self.registry.create(url, speed, kind, token.clone()).await;
        metrics::JOBS_SUBMITTED
            .with_label_values(&[kind.as_str()])
            .inc();
        info!(job_id = %job_id, kind = kind.as_str(), speed, "Job submitted for {}", url);

        let runner = self.runner.clone();
        let id = job_id.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            runner.run(id, url, speed, kind, token).await;
        });

        Ok(job_id)
    }

    pub async fn status(&self, job_id: &str) -> Result<Job, OrchestratorError> {
        Ok(self.registry.get(job_id).await?)
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Vec<Job> {
        self.registry.list().await
    }

    /// Cancels a queued or running job and kills its process.
    pub async fn cancel(&self, job_id: &str) -> Result<(), OrchestratorError> {
        self.registry.request_cancel(job_id).await?;
        metrics::JOBS_FINISHED
            .with_label_values(&[JobStatus::Cancelled.as_str()])
            .inc();
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.registry.subscribe()
    }

    /// Looks up what a URL points at without downloading anything.
    pub async fn preview(&self, url: &str) -> Result<MediaInfo, OrchestratorError> {
        let url = Self::require_url(url)?;
        Ok(self.fetcher.fetch_metadata(url).await?)
    }

    /// Artifacts in one directory, newest first.
    pub async fn list_artifacts(
        &self,
        location: ArtifactLocation,
    ) -> Result<Vec<ArtifactInfo>, OrchestratorError> {
        let entries = self.placer.scan(location).await?;
        let mut artifacts = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = self.placer.dir(location).join(&entry.name);
            let has_thumbnail = self.converter.has_artwork(&path).await;
            artifacts.push(ArtifactInfo {
                size: entry.size_mb(),
                modified: entry.modified,
                name: entry.name,
                has_thumbnail,
                location,
            });
        }
        Ok(artifacts)
    }

    pub async fn list_all_artifacts(&self) -> Result<ArtifactListing, OrchestratorError> {
        Ok(ArtifactListing {
            temp_files: self.list_artifacts(ArtifactLocation::Temp).await?,
            output_files: self.list_artifacts(ArtifactLocation::Output).await?,
        })
    }

    /// Embedded cover picture of an artifact.
    pub async fn artwork(
        &self,
        location: ArtifactLocation,
        name: &str,
    ) -> Result<Artwork, OrchestratorError> {
        let path = self.existing_artifact(location, name).await?;
        Ok(self.converter.extract_artwork(&path).await?)
    }

    pub async fn delete_artifact(
        &self,
        location: ArtifactLocation,
        name: &str,
    ) -> Result<(), OrchestratorError> {
        Ok(self.placer.delete_artifact(location, name).await?)
    }

    /// Moves named artifacts from temp to output. Per-file failures are
    /// reported, not raised.
    pub async fn move_artifacts(&self, names: &[String]) -> Result<MoveReport, OrchestratorError> {
        if names.is_empty() {
            return Err(OrchestratorError::validation("No files specified"));
        }
        Ok(self.placer.move_artifacts(names).await)
    }

    /// Path of an existing artifact, for streaming.
    pub async fn artifact_path(
        &self,
        location: ArtifactLocation,
        name: &str,
    ) -> Result<PathBuf, OrchestratorError> {
        self.existing_artifact(location, name).await
    }

    /// Checks the external tools. Failures are logged, not fatal.
    pub async fn validate_tools(&self) -> bool {
        let mut ok = true;
        if let Err(e) = self.fetcher.validate().await {
            warn!("{} is not usable: {}", self.fetcher.name(), e);
            ok = false;
        }
        if let Err(e) = self.converter.validate().await {
            warn!("{} is not usable: {}", self.converter.name(), e);
            ok = false;
        }
        ok
    }

    /// Cancels every job and stops accepting work from running tasks.
    pub fn shutdown(&self) {
        info!("Cancelling all running jobs");
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    async fn existing_artifact(
        &self,
        location: ArtifactLocation,
        name: &str,
    ) -> Result<PathBuf, OrchestratorError> {
        let path = self.placer.resolve(location, name)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(path),
            _ => Err(PlacerError::SourceNotFound { path }.into()),
        }
    }

    fn require_url(url: &str) -> Result<&str, OrchestratorError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(OrchestratorError::validation("No URL provided"));
        }
        Ok(url)
    }

    fn normalize_speed(&self, speed: Option<f64>) -> Result<f64, OrchestratorError> {
        let speed = match speed {
            None => return Ok(1.0),
            Some(s) if s == 0.0 => return Ok(1.0),
            Some(s) => s,
        };
        if !speed.is_finite() || speed <= 0.0 {
            return Err(OrchestratorError::validation(format!(
                "Invalid speed: {}",
                speed
            )));
        }
        if speed > self.config.max_speed {
            return Err(OrchestratorError::validation(format!(
                "Speed {} exceeds the maximum of {}",
                speed, self.config.max_speed
            )));
        }
        Ok(speed)
    }
}

impl Drop for JobOrchestrator {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
