//! Per-job execution control handed to the running task.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::registry::JobRegistry;
use crate::process::ProcessHandle;

/// What a running workflow needs to cooperate with cancellation: the job's
/// token, plus a way to register the external process it is waiting on.
#[derive(Clone)]
pub struct JobControl {
    job_id: String,
    token: CancellationToken,
    registry: Option<Arc<JobRegistry>>,
}

impl JobControl {
    pub fn new(
        job_id: impl Into<String>,
        token: CancellationToken,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            token,
            registry: Some(registry),
        }
    }

    /// Control not tied to any registered job, e.g. for previews.
    pub fn detached(token: CancellationToken) -> Self {
        Self {
            job_id: String::new(),
            token,
            registry: None,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) async fn attach(&self, process: &Arc<ProcessHandle>) {
        if let Some(registry) = &self.registry {
            registry.attach_process(&self.job_id, process).await;
        }
    }

    pub(crate) async fn detach(&self) {
        if let Some(registry) = &self.registry {
            registry.detach_process(&self.job_id).await;
        }
    }
}

impl std::fmt::Debug for JobControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobControl")
            .field("job_id", &self.job_id)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
