//! Mapping of orchestrator errors onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tempofetch_core::{OrchestratorError, PlacerError};
use tracing::error;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by every API handler.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request the orchestrator never saw.
    BadRequest(String),
    Orchestrator(OrchestratorError),
}

impl From<OrchestratorError> for ApiError {
    fn from(error: OrchestratorError) -> Self {
        Self::Orchestrator(error)
    }
}

impl From<PlacerError> for ApiError {
    fn from(error: PlacerError) -> Self {
        Self::Orchestrator(error.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Orchestrator(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Self::Orchestrator(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
            Self::Orchestrator(e) => {
                error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
