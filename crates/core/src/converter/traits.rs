//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use crate::job::JobControl;

/// An embedded picture extracted from an audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

impl Artwork {
    /// Wraps raw image bytes, sniffing PNG by its signature and assuming
    /// JPEG otherwise.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
        let content_type = if data.starts_with(PNG_SIGNATURE) {
            "image/png"
        } else {
            "image/jpeg"
        };
        Self { data, content_type }
    }
}

/// Post-processes downloaded audio files.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Changes the tempo of `path` in place by `multiplier`.
    ///
    /// The file is only replaced once the new version is complete; on any
    /// failure the original is left untouched. A multiplier of exactly 1.0
    /// is a no-op.
    async fn apply_tempo(
        &self,
        path: &Path,
        multiplier: f64,
        control: &JobControl,
    ) -> Result<(), ConverterError>;

    /// Whether the file carries an embedded picture.
    async fn has_artwork(&self, path: &Path) -> bool;

    /// Extracts the embedded picture of an audio file.
    async fn extract_artwork(&self, path: &Path) -> Result<Artwork, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
