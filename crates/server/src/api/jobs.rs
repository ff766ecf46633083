//! Download job API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempofetch_core::{Job, JobKind, JobStatus};
use tracing::info;

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a download
#[derive(Debug, Default, Deserialize)]
pub struct DownloadBody {
    #[serde(default)]
    pub url: String,
    /// Speed multiplier; missing or 0 means unchanged.
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub download_id: String,
}

/// Response for job queries
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub status: JobStatus,
    pub message: String,
    pub url: String,
    pub speed: f64,
    pub kind: JobKind,
    pub created_at: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            message: job.message,
            url: job.url,
            speed: job.speed,
            kind: job.kind,
            created_at: job.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a download job
pub async fn start_download(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let Json(body) = body?;
    let download_id = state.orchestrator().submit(&body.url, body.speed).await?;
    Ok(Json(DownloadResponse { download_id }))
}

/// Get a job by id
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state.orchestrator().status(&id).await?;
    Ok(Json(job.into()))
}

/// List all jobs, newest first
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<ListJobsResponse> {
    let jobs = state
        .orchestrator()
        .list()
        .await
        .into_iter()
        .map(JobResponse::from)
        .collect();
    Json(ListJobsResponse { jobs })
}

/// Cancel a job
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.orchestrator().cancel(&id).await?;
    info!(job_id = %id, "Job cancelled via API");
    Ok(Json(SuccessResponse { success: true }))
}
