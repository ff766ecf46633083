//! Artifact file handlers: listing, cover art, delete, move and streaming.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempofetch_core::{ArtifactListing, ArtifactLocation};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::info;

use super::error::ApiError;
use super::jobs::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    #[serde(default)]
    pub filenames: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub success: bool,
    pub moved: usize,
    pub errors: Vec<String>,
}

/// List artifacts in both directories
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ArtifactListing>, ApiError> {
    Ok(Json(state.orchestrator().list_all_artifacts().await?))
}

/// Serve the embedded cover picture of an artifact
pub async fn thumbnail(
    State(state): State<Arc<AppState>>,
    Path((location, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let location: ArtifactLocation = location.parse()?;
    let artwork = state.orchestrator().artwork(location, &name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, artwork.content_type),
            (header::CACHE_CONTROL, "max-age=3600"),
        ],
        artwork.data,
    )
        .into_response())
}

/// Delete an artifact from the working directory
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((location, name)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let location: ArtifactLocation = location.parse()?;
    state.orchestrator().delete_artifact(location, &name).await?;
    info!("Deleted {}/{}", location, name);
    Ok(Json(SuccessResponse { success: true }))
}

/// Move artifacts from the working directory to the output directory
pub async fn move_files(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MoveBody>, JsonRejection>,
) -> Result<Json<MoveResponse>, ApiError> {
    let Json(body) = body?;
    let report = state.orchestrator().move_artifacts(&body.filenames).await?;
    info!(
        "Moved {} of {} files to output",
        report.moved,
        body.filenames.len()
    );
    Ok(Json(MoveResponse {
        success: true,
        moved: report.moved,
        errors: report.errors,
    }))
}

/// Stream an artifact, honouring range requests
pub async fn stream_file(
    State(state): State<Arc<AppState>>,
    Path((location, name)): Path<(String, String)>,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    let location: ArtifactLocation = location.parse()?;
    let path = state.orchestrator().artifact_path(location, &name).await?;

    let response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = response.map(Body::new);
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    }
    Ok(response)
}
