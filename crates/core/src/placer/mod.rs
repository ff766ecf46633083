//! Placer module for the working and destination directories.
//!
//! Downloads land in a flat working directory (`temp`). Users list, preview,
//! delete and finally move the files they want to keep into a flat
//! destination directory (`output`). Both directories are shared between
//! running jobs and API requests.
//!
//! # Features
//!
//! - Atomic rename when both directories are on the same filesystem
//! - Copy, fsync and delete fallback when a rename crosses devices
//! - Per-file error reporting for batch moves
//! - Path traversal protection for user supplied file names
//!
//! # Example
//!
//! ```ignore
//! use tempofetch_core::placer::{FsPlacer, PlacerConfig, ArtifactLocation};
//!
//! let placer = FsPlacer::new(PlacerConfig::default(), "/temp", "/output");
//!
//! for entry in placer.scan(ArtifactLocation::Temp).await? {
//!     println!("{} ({} MB)", entry.name, entry.size_mb());
//! }
//!
//! let report = placer.move_artifacts(&["song.mp3".to_string()]).await;
//! println!("Moved {} files, {} errors", report.moved, report.errors.len());
//! ```

mod config;
mod error;
mod fs_placer;
mod types;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs_placer::{is_artifact, FsPlacer, PARTIAL_SUFFIX};
pub use types::{ArtifactEntry, ArtifactLocation, MoveReport};
