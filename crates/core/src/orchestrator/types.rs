//! Types for the job orchestrator.

use serde::Serialize;
use thiserror::Error;

use crate::converter::ConverterError;
use crate::fetcher::FetchError;
use crate::job::JobError;
use crate::placer::{ArtifactLocation, PlacerError};

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Rejected input; no job or file was touched.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Placer(#[from] PlacerError),

    #[error(transparent)]
    Converter(#[from] ConverterError),
}

impl OrchestratorError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Whether the caller supplied bad input.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Job(JobError::NotCancellable { .. }) => true,
            Self::Placer(e) => e.is_invalid_input(),
            _ => false,
        }
    }

    /// Whether the referenced job or file does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Job(JobError::NotFound(_)) => true,
            Self::Placer(e) => e.is_not_found(),
            Self::Converter(ConverterError::InputNotFound { .. }) => true,
            Self::Converter(ConverterError::ArtworkNotFound { .. }) => true,
            _ => false,
        }
    }
}

/// An audio artifact as shown in file listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    /// Size in MiB, two decimals.
    pub size: f64,
    /// Modification time, unix seconds.
    pub modified: i64,
    pub has_thumbnail: bool,
    pub location: ArtifactLocation,
}

/// Both directories' listings, newest first within each.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArtifactListing {
    pub temp_files: Vec<ArtifactInfo>,
    pub output_files: Vec<ArtifactInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(OrchestratorError::validation("No URL provided").is_client_error());
        assert!(OrchestratorError::from(JobError::NotFound("x".to_string())).is_not_found());
        assert!(OrchestratorError::from(PlacerError::InvalidLocation("x".to_string()))
            .is_client_error());
        assert!(!OrchestratorError::from(FetchError::EmptyPlaylist).is_client_error());
    }

    #[test]
    fn test_artifact_info_serialization() {
        let info = ArtifactInfo {
            name: "song.mp3".to_string(),
            size: 3.29,
            modified: 1_700_000_000,
            has_thumbnail: true,
            location: ArtifactLocation::Temp,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["location"], "temp");
        assert_eq!(json["size"], 3.29);
        assert_eq!(json["has_thumbnail"], true);
    }
}
