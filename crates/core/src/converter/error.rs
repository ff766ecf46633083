//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::ToolError;
use crate::tempo::TempoError;

/// Errors that can occur while post-processing audio.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The requested speed cannot be planned.
    #[error(transparent)]
    InvalidTempo(#[from] TempoError),

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The file carries no embedded picture.
    #[error("No artwork found in {path}")]
    ArtworkNotFound { path: PathBuf },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job was cancelled.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Maps a failed ffmpeg run onto a converter error.
    pub(crate) fn from_tool(error: ToolError, ffmpeg_path: &std::path::Path) -> Self {
        match error {
            ToolError::Cancelled => Self::Cancelled,
            ToolError::NotFound { .. } => Self::FfmpegNotFound {
                path: ffmpeg_path.to_path_buf(),
            },
            ToolError::Io { source, .. } => Self::Io(source),
            failed @ ToolError::Failed { .. } => {
                let stderr = failed.diagnostic();
                Self::conversion_failed(failed.to_string(), Some(stderr))
            }
        }
    }

    /// Text for a job message: ffmpeg's own diagnostics when available.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::ConversionFailed {
                stderr: Some(stderr),
                ..
            } if !stderr.is_empty() => stderr.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
