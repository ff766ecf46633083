//! Fetcher module for media metadata and audio downloads.
//!
//! The `MediaFetcher` trait abstracts the external download tool;
//! `YtDlpFetcher` drives yt-dlp. URL classification lives in [`url`] so
//! preview and download agree on what a playlist is.

mod config;
mod error;
mod traits;
mod types;
pub mod url;
mod ytdlp;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use traits::MediaFetcher;
pub use types::{FetchOutput, FetchTarget, MediaInfo, MediaKind, PlaylistMember};
pub use url::is_playlist_url;
pub use ytdlp::YtDlpFetcher;
