//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external tool traits,
//! allowing job and API tests without yt-dlp or ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use tempofetch_core::testing::{MockConverter, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! let converter = MockConverter::new();
//!
//! fetcher.set_playlist_files(vec!["one.mp3".into(), "two.mp3".into()]).await;
//! converter.fail_for("two.mp3").await;
//!
//! // Use in a JobOrchestrator...
//! ```

mod mock_converter;
mod mock_fetcher;

pub use mock_converter::{MockConverter, RecordedTempo};
pub use mock_fetcher::MockFetcher;
