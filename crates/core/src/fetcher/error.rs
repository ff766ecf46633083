//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::ToolError;

/// Errors from fetching metadata or media.
#[derive(Debug, Error)]
pub enum FetchError {
    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    YtDlpNotFound { path: PathBuf },

    /// yt-dlp ran but failed.
    #[error("{context}: {diagnostic}")]
    ToolFailed { context: String, diagnostic: String },

    /// yt-dlp output could not be understood.
    #[error("Failed to parse yt-dlp output: {reason}")]
    ParseError { reason: String },

    /// A playlist listing returned no members.
    #[error("No videos found in playlist")]
    EmptyPlaylist,

    /// The download finished but no artifact could be located.
    #[error("No MP3 file was created")]
    NoArtifact,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The owning job was cancelled.
    #[error("Download cancelled")]
    Cancelled,
}

impl FetchError {
    /// Creates a parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }

    /// Maps a failed yt-dlp run, tagging it with what was being attempted.
    pub(crate) fn from_tool(error: ToolError, ytdlp_path: &std::path::Path, context: &str) -> Self {
        match error {
            ToolError::Cancelled => Self::Cancelled,
            ToolError::NotFound { .. } => Self::YtDlpNotFound {
                path: ytdlp_path.to_path_buf(),
            },
            ToolError::Io { source, .. } => Self::Io(source),
            failed @ ToolError::Failed { .. } => Self::ToolFailed {
                context: context.to_string(),
                diagnostic: failed.diagnostic(),
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
