//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while managing artifact files.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// Source file not found.
    #[error("File not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Unknown storage location name.
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// File name is empty or would escape its directory.
    #[error("Invalid file name: {name}")]
    InvalidName { name: String },

    /// The operation is not allowed in this location.
    #[error("{reason}")]
    Forbidden { reason: String },

    /// Failed to copy file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move/rename file.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Copied, but the source could not be removed afterwards.
    #[error("Copied but failed to remove source: {path}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacerError {
    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }

    /// Whether the caller supplied a bad location or name.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidLocation(_) | Self::InvalidName { .. } | Self::Forbidden { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound { .. })
    }
}
