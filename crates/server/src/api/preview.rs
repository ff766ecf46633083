//! URL preview handler.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tempofetch_core::MediaInfo;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewBody {
    #[serde(default)]
    pub url: String,
}

/// Look up title, duration and thumbnail (or playlist members) for a URL.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PreviewBody>, JsonRejection>,
) -> Result<Json<MediaInfo>, ApiError> {
    let Json(body) = body?;
    let info = state.orchestrator().preview(&body.url).await?;
    Ok(Json(info))
}
