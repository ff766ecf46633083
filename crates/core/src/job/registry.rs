//! In-memory job registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{Job, JobError, JobEvent, JobKind, JobStatus};
use crate::process::ProcessHandle;

const CANCELLED_BY_USER: &str = "Job cancelled by user";

struct JobEntry {
    job: Job,
    /// Creation order, breaks ties between equal timestamps.
    seq: u64,
    token: CancellationToken,
    process: Option<Weak<ProcessHandle>>,
}

/// Concurrency-safe store of all jobs known to this process.
///
/// Jobs are never evicted. Readers get snapshots; the cancellation token and
/// process handle of a job stay inside the registry.
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobEntry>>,
    next_seq: AtomicU64,
    events: broadcast::Sender<JobEvent>,
}

impl JobRegistry {
    pub fn new(event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            jobs: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            events,
        }
    }

    /// Registers a new queued job owning `token` and returns its id.
    pub async fn create(
        &self,
        url: &str,
        speed: f64,
        kind: JobKind,
        token: CancellationToken,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let job = Job {
            id: id.clone(),
            status: JobStatus::Queued,
            message: "Starting download...".to_string(),
            url: url.to_string(),
            speed,
            kind,
            created_at: Utc::now(),
        };
        let event = JobEvent {
            job_id: id.clone(),
            status: job.status,
            message: job.message.clone(),
        };

        let entry = JobEntry {
            job,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            token,
            process: None,
        };
        self.jobs.write().await.insert(id.clone(), entry);

        debug!(job_id = %id, "Job created");
        let _ = self.events.send(event);
        id
    }

    pub async fn get(&self, id: &str) -> Result<Job, JobError> {
        self.jobs
            .read()
            .await
            .get(id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.read().await;
        let mut entries: Vec<&JobEntry> = jobs.values().collect();
        entries.sort_by(|a, b| {
            b.job
                .created_at
                .cmp(&a.job.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|entry| entry.job.clone()).collect()
    }

    /// Moves a job to `status` with a new message.
    ///
    /// Fails with [`JobError::InvalidTransition`] when the state machine
    /// forbids the move, which is how a late write from an executor is kept
    /// from overwriting a cancelled job.
    pub async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        message: impl Into<String>,
    ) -> Result<(), JobError> {
        let message = message.into();
        let event = {
            let mut jobs = self.jobs.write().await;
            let entry = jobs
                .get_mut(id)
                .ok_or_else(|| JobError::NotFound(id.to_string()))?;

            let from = entry.job.status;
            if !from.can_transition_to(status) {
                return Err(JobError::InvalidTransition {
                    id: id.to_string(),
                    from,
                    to: status,
                });
            }

            entry.job.status = status;
            entry.job.message = message.clone();
            if status.is_terminal() {
                entry.process = None;
            }
            if from != status {
                debug!(job_id = %id, "Job {} -> {}", from, status);
            }
            JobEvent {
                job_id: id.to_string(),
                status,
                message,
            }
        };

        let _ = self.events.send(event);
        Ok(())
    }

    /// Replaces the message of a job that is still active.
    pub async fn set_message(&self, id: &str, message: impl Into<String>) -> Result<(), JobError> {
        let status = self.get(id).await?.status;
        self.update_status(id, status, message).await
    }

    /// Cancels an active job.
    ///
    /// Signals the job's token, terminates its running process if any, and
    /// marks it cancelled. Jobs already in a terminal state, including ones
    /// cancelled earlier, are rejected with [`JobError::NotCancellable`].
    pub async fn request_cancel(&self, id: &str) -> Result<(), JobError> {
        let event = {
            let mut jobs = self.jobs.write().await;
            let entry = jobs
                .get_mut(id)
                .ok_or_else(|| JobError::NotFound(id.to_string()))?;

            if !entry.job.status.is_cancellable() {
                return Err(JobError::NotCancellable {
                    id: id.to_string(),
                    status: entry.job.status,
                });
            }

            entry.token.cancel();
            if let Some(process) = entry.process.take().and_then(|weak| weak.upgrade()) {
                if process.terminate() {
                    info!(job_id = %id, pid = ?process.pid(), "Terminated running process");
                }
            }

            entry.job.status = JobStatus::Cancelled;
            entry.job.message = CANCELLED_BY_USER.to_string();
            JobEvent {
                job_id: id.to_string(),
                status: JobStatus::Cancelled,
                message: CANCELLED_BY_USER.to_string(),
            }
        };

        info!(job_id = %id, "Job cancelled");
        let _ = self.events.send(event);
        Ok(())
    }

    /// Records the process currently running for a job.
    pub async fn attach_process(&self, id: &str, process: &Arc<ProcessHandle>) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(entry) if !entry.job.status.is_terminal() => {
                entry.process = Some(Arc::downgrade(process));
            }
            Some(_) => {
                // Cancelled between spawn and attach; the token stops it.
                debug!(job_id = %id, "Not attaching process to finished job");
            }
            None => warn!(job_id = %id, "Attach for unknown job"),
        }
    }

    pub async fn detach_process(&self, id: &str) {
        if let Some(entry) = self.jobs.write().await.get_mut(id) {
            entry.process = None;
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Number of jobs per status.
    pub async fn counts_by_status(&self) -> HashMap<JobStatus, usize> {
        let jobs = self.jobs.read().await;
        let mut counts = HashMap::new();
        for entry in jobs.values() {
            *counts.entry(entry.job.status).or_insert(0) += 1;
        }
        counts
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(256)
    }
}
