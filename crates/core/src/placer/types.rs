//! Types for the placer module.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::PlacerError;

/// One of the two flat storage directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactLocation {
    /// Working area where downloads land.
    Temp,
    /// Destination for files the user decided to keep.
    Output,
}

impl ArtifactLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::Output => "output",
        }
    }
}

impl FromStr for ArtifactLocation {
    type Err = PlacerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temp" => Ok(Self::Temp),
            "output" => Ok(Self::Output),
            other => Err(PlacerError::InvalidLocation(other.to_string())),
        }
    }
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw directory entry for an audio artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactEntry {
    pub name: String,
    pub size_bytes: u64,
    /// Modification time, unix seconds.
    pub modified: i64,
}

impl ArtifactEntry {
    /// Size in MiB rounded to two decimals.
    pub fn size_mb(&self) -> f64 {
        (self.size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

/// Outcome of moving a batch of artifacts from temp to output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoveReport {
    pub moved: usize,
    /// One `"<name>: <reason>"` entry per file that could not be moved.
    pub errors: Vec<String>,
}
