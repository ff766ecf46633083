//! Per-job executor.
//!
//! One [`JobRunner::run`] call drives one job from `queued` to a terminal
//! state. Every tool invocation goes through the job's [`JobControl`], so a
//! cancel request reaches whatever process is running at that moment.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::converter::{Converter, ConverterError};
use crate::fetcher::{FetchError, FetchOutput, FetchTarget, MediaFetcher};
use crate::job::{JobControl, JobError, JobKind, JobRegistry, JobStatus};
use crate::metrics;
use crate::placer::{ArtifactLocation, FsPlacer};

use super::config::OrchestratorConfig;

/// Why a workflow stopped short of `completed`.
#[derive(Debug)]
enum Interrupted {
    Cancelled(String),
    Failed(String),
}

/// Everything a job needs to run. Cheap to clone; one clone per spawned job.
#[derive(Clone)]
pub struct JobRunner {
    config: OrchestratorConfig,
    registry: Arc<JobRegistry>,
    fetcher: Arc<dyn MediaFetcher>,
    converter: Arc<dyn Converter>,
    placer: Arc<FsPlacer>,
}

impl JobRunner {
    pub fn new(
        config: OrchestratorConfig,
        registry: Arc<JobRegistry>,
        fetcher: Arc<dyn MediaFetcher>,
        converter: Arc<dyn Converter>,
        placer: Arc<FsPlacer>,
    ) -> Self {
        Self {
            config,
            registry,
            fetcher,
            converter,
            placer,
        }
    }

    /// Runs a registered job to completion.
    ///
    /// Never returns an error: every outcome, including cancellation and
    /// tool failures, ends up in the job's status and message.
    pub async fn run(
        &self,
        job_id: String,
        url: String,
        speed: f64,
        kind: JobKind,
        token: CancellationToken,
    ) {
        let control = JobControl::new(job_id.clone(), token, Arc::clone(&self.registry));

        if control.is_cancelled() {
            info!(job_id = %job_id, "Job cancelled before starting");
            self.finish(&job_id, JobStatus::Cancelled, "Job cancelled before starting")
                .await;
            return;
        }

        if let Err(e) = self
            .registry
            .update_status(&job_id, JobStatus::Downloading, "Starting download...")
            .await
        {
            debug!(job_id = %job_id, "Job not started: {}", e);
            return;
        }

        let start = Instant::now();
        info!(job_id = %job_id, kind = kind.as_str(), speed, "Running job for {}", url);

        let outcome = match kind {
            JobKind::Single => self.run_single(&control, &url, speed).await,
            JobKind::Playlist => self.run_playlist(&control, &url, speed).await,
        };

        metrics::JOB_DURATION
            .with_label_values(&[kind.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match outcome {
            Ok(message) => {
                info!(job_id = %job_id, "{}", message);
                self.finish(&job_id, JobStatus::Completed, message).await;
            }
            Err(Interrupted::Cancelled(message)) => {
                info!(job_id = %job_id, "{}", message);
                self.finish(&job_id, JobStatus::Cancelled, message).await;
            }
            Err(Interrupted::Failed(message)) => {
                error!(job_id = %job_id, "Job failed: {}", message);
                self.finish(&job_id, JobStatus::Error, message).await;
            }
        }
    }

    async fn run_single(
        &self,
        control: &JobControl,
        url: &str,
        speed: f64,
    ) -> Result<String, Interrupted> {
        self.progress(control, "Downloading video...").await?;

        let primary = FetchTarget::primary(url);
        let output = match self.fetch_attempt(&primary, control).await {
            Ok(output) => output,
            Err(e) if e.is_cancelled() => return Err(self.cancelled(control)),
            Err(e) => {
                let alternate = FetchTarget::alternate(url);
                if alternate == primary {
                    return Err(Interrupted::Failed(self.excerpt(&e.to_string())));
                }
                warn!(
                    job_id = %control.job_id(),
                    "Download via {} failed, retrying with the full URL: {}",
                    primary.strategy(),
                    e
                );
                match self.fetch_attempt(&alternate, control).await {
                    Ok(output) => output,
                    Err(e) if e.is_cancelled() => return Err(self.cancelled(control)),
                    Err(e) => return Err(Interrupted::Failed(self.excerpt(&e.to_string()))),
                }
            }
        };

        let artifact = match output.reported_path {
            Some(path) => path,
            None => self
                .placer
                .newest_artifact(ArtifactLocation::Temp)
                .await
                .map_err(|e| Interrupted::Failed(e.to_string()))?
                .ok_or_else(|| Interrupted::Failed(FetchError::NoArtifact.to_string()))?,
        };
        debug!(job_id = %control.job_id(), "Artifact at {}", artifact.display());

        if speed == 1.0 {
            return Ok("Download completed".to_string());
        }

        if control.is_cancelled() {
            return Err(self.cancelled(control));
        }
        self.transition(
            control,
            JobStatus::Processing,
            format!("Applying {:.1}x speed adjustment...", speed),
        )
        .await?;

        match self.apply_tempo(&artifact, speed, control).await {
            Ok(()) => Ok(format!("Download completed with {:.1}x speed", speed)),
            Err(e) if e.is_cancelled() => Err(self.cancelled(control)),
            Err(e) => Err(Interrupted::Failed(
                self.excerpt(&format!("Failed to adjust speed: {}", e.diagnostic())),
            )),
        }
    }

    async fn run_playlist(
        &self,
        control: &JobControl,
        url: &str,
        speed: f64,
    ) -> Result<String, Interrupted> {
        self.progress(control, "Downloading playlist...").await?;

        let before = self.artifact_names().await?;
        let fetched = self
            .fetcher
            .fetch_playlist_audio(url, self.placer.temp_dir(), control)
            .await;
        if matches!(&fetched, Err(e) if e.is_cancelled()) {
            return Err(self.cancelled(control));
        }
        let after = self.artifact_names().await?;

        let new_files: Vec<String> = after
            .difference(&before)
            .cloned()
            .collect();
        let total = new_files.len();

        if let Err(e) = fetched {
            if new_files.is_empty() {
                return Err(Interrupted::Failed(self.excerpt(&e.to_string())));
            }
            warn!(
                job_id = %control.job_id(),
                "Playlist finished with errors, continuing with {} new files: {}",
                total,
                e
            );
        }
        info!(job_id = %control.job_id(), "Downloaded {} files from playlist", total);

        if speed == 1.0 {
            return Ok(format!("Downloaded {} files", total));
        }
        if new_files.is_empty() {
            return Ok(format!("Downloaded {} files with {:.1}x speed", total, speed));
        }

        self.transition(
            control,
            JobStatus::Processing,
            format!("Applying {:.1}x speed to {} files...", speed, total),
        )
        .await?;

        let mut succeeded = 0;
        let mut failed = 0;
        for (i, name) in new_files.iter().enumerate() {
            if control.is_cancelled() {
                return Err(Interrupted::Cancelled(format!(
                    "Cancelled after processing {}/{} files",
                    i, total
                )));
            }
            self.progress(control, format!("Processing {}/{}: {}", i + 1, total, name))
                .await?;

            let path = self.placer.temp_dir().join(name);
            match self.apply_tempo(&path, speed, control).await {
                Ok(()) => succeeded += 1,
                Err(e) if e.is_cancelled() => {
                    return Err(Interrupted::Cancelled(format!(
                        "Cancelled after processing {}/{} files",
                        i, total
                    )));
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        job_id = %control.job_id(),
                        "Failed to adjust speed for {}: {}",
                        name,
                        e.diagnostic()
                    );
                }
            }
        }

        if failed == 0 {
            Ok(format!("Downloaded {} files with {:.1}x speed", total, speed))
        } else {
            Ok(format!(
                "Downloaded {} files, applied {:.1}x speed to {}/{} ({} failed)",
                total, speed, succeeded, total, failed
            ))
        }
    }

    async fn fetch_attempt(
        &self,
        target: &FetchTarget,
        control: &JobControl,
    ) -> Result<FetchOutput, FetchError> {
        let result = self
            .fetcher
            .fetch_audio(target, self.placer.temp_dir(), control)
            .await;
        let label = match &result {
            Ok(_) => "success",
            Err(e) if e.is_cancelled() => "cancelled",
            Err(_) => "failure",
        };
        metrics::FETCH_ATTEMPTS
            .with_label_values(&[target.strategy(), label])
            .inc();
        result
    }

    async fn apply_tempo(
        &self,
        path: &Path,
        speed: f64,
        control: &JobControl,
    ) -> Result<(), ConverterError> {
        let result = self.converter.apply_tempo(path, speed, control).await;
        let label = if result.is_ok() { "success" } else { "failure" };
        metrics::TEMPO_TRANSFORMS.with_label_values(&[label]).inc();
        result
    }

    async fn artifact_names(&self) -> Result<BTreeSet<String>, Interrupted> {
        self.placer
            .snapshot(ArtifactLocation::Temp)
            .await
            .map_err(|e| Interrupted::Failed(e.to_string()))
    }

    /// Updates the message; fails only when the job was finalized elsewhere.
    async fn progress(
        &self,
        control: &JobControl,
        message: impl Into<String>,
    ) -> Result<(), Interrupted> {
        self.registry
            .set_message(control.job_id(), message)
            .await
            .map_err(|_| self.cancelled(control))
    }

    async fn transition(
        &self,
        control: &JobControl,
        status: JobStatus,
        message: impl Into<String>,
    ) -> Result<(), Interrupted> {
        self.registry
            .update_status(control.job_id(), status, message)
            .await
            .map_err(|_| self.cancelled(control))
    }

    fn cancelled(&self, control: &JobControl) -> Interrupted {
        debug!(job_id = %control.job_id(), "Stopping cancelled job");
        Interrupted::Cancelled("Download cancelled".to_string())
    }

    /// Writes the terminal state. A job cancelled by the user already sits in
    /// `cancelled`; that write is rejected and the user's message stays.
    async fn finish(&self, job_id: &str, status: JobStatus, message: impl Into<String>) {
        match self.registry.update_status(job_id, status, message).await {
            Ok(()) => {
                metrics::JOBS_FINISHED
                    .with_label_values(&[status.as_str()])
                    .inc();
            }
            Err(JobError::InvalidTransition { from, .. }) => {
                debug!(job_id = %job_id, "Job already {}, dropping {} result", from, status);
            }
            Err(e) => warn!(job_id = %job_id, "Failed to record job result: {}", e),
        }
    }

    fn excerpt(&self, text: &str) -> String {
        excerpt(text, self.config.error_excerpt_chars)
    }
}

/// First `max_chars` characters of `text`.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
