//! Job orchestration.
//!
//! The orchestrator turns a download request into a background job:
//! - **Single videos**: one yt-dlp run (with one retry using the full URL),
//!   then an optional tempo transform of the produced file
//! - **Playlists**: one yt-dlp run for the whole list, a before/after diff of
//!   the working directory to find new files, then a tempo transform of each
//!   new file in turn, continuing past per-file failures
//!
//! Jobs run concurrently without a limit. Each one owns a cancellation token
//! derived from the orchestrator's root token.

mod config;
mod runner;
mod service;
mod types;

pub use config::OrchestratorConfig;
pub use runner::JobRunner;
pub use service::JobOrchestrator;
pub use types::{ArtifactInfo, ArtifactListing, OrchestratorError};
