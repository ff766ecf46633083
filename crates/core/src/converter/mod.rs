//! Converter module for post-processing downloaded audio.
//!
//! This module provides the `Converter` trait and an FFmpeg implementation
//! that changes the tempo of an MP3 in place while keeping its embedded
//! cover art and tags, plus helpers to inspect and extract that artwork.
//!
//! # Example
//!
//! ```ignore
//! use tempofetch_core::converter::{Converter, FfmpegConverter};
//! use tempofetch_core::job::JobControl;
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! // Speed a file up by 2.5x: runs `atempo=2.0000,atempo=1.2500` in one pass.
//! converter
//!     .apply_tempo(Path::new("/temp/song.mp3"), 2.5, &control)
//!     .await?;
//!
//! if converter.has_artwork(Path::new("/temp/song.mp3")).await {
//!     let artwork = converter.extract_artwork(Path::new("/temp/song.mp3")).await?;
//!     println!("{} bytes of {}", artwork.data.len(), artwork.content_type);
//! }
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::{Artwork, Converter};
