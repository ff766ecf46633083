//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::{Artwork, Converter};
use crate::job::JobControl;
use crate::placer::PARTIAL_SUFFIX;
use crate::process::run_tool;
use crate::tempo::TempoChain;

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Path of the temporary sibling for `input`.
    fn temp_path(input: &Path) -> PathBuf {
        let mut name = OsString::from(input.as_os_str());
        name.push(PARTIAL_SUFFIX);
        PathBuf::from(name)
    }

    /// Builds ffmpeg arguments for a tempo change.
    ///
    /// All stages go into one filter expression. Video streams (the cover
    /// picture) are copied as-is and the artwork tags are written again
    /// because the MP3 muxer drops them otherwise.
    fn build_tempo_args(&self, input_path: &Path, output_path: &Path, filter: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-filter:a".to_string(),
            filter.to_string(),
            "-map".to_string(),
            "0:a".to_string(),
            "-map".to_string(),
            "0:v?".to_string(),
            "-map_metadata".to_string(),
            "0".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-id3v2_version".to_string(),
            self.config.id3v2_version.to_string(),
            "-metadata:s:v".to_string(),
            "title=Album cover".to_string(),
            "-metadata:s:v".to_string(),
            "comment=Cover (front)".to_string(),
            "-acodec".to_string(),
            self.config.audio_codec.clone(),
            "-b:a".to_string(),
            self.config.audio_bitrate.clone(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-y".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    fn build_probe_artwork_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "stream=codec_name".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    fn build_extract_artwork_args(path: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            path.to_string_lossy().to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-f".to_string(),
            "image2pipe".to_string(),
            "-".to_string(),
        ]
    }

    async fn discard_temp(path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed partial output {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
        }
    }

    async fn check_binary(path: &Path) -> Result<(), std::io::Error> {
        Command::new(path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn apply_tempo(
        &self,
        path: &Path,
        multiplier: f64,
        control: &JobControl,
    ) -> Result<(), ConverterError> {
        let chain = TempoChain::plan(multiplier)?;
        let Some(filter) = chain.filter_expression() else {
            return Ok(());
        };

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let start = Instant::now();
        let temp_path = Self::temp_path(path);
        let args = self.build_tempo_args(path, &temp_path, &filter);
        debug!(job_id = %control.job_id(), "ffmpeg {}", args.join(" "));

        let mut command = Command::new(&self.config.ffmpeg_path);
        command.args(&args);

        if let Err(e) = run_tool(command, control).await {
            Self::discard_temp(&temp_path).await;
            return Err(ConverterError::from_tool(e, &self.config.ffmpeg_path));
        }

        // rename() replaces the destination atomically
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            Self::discard_temp(&temp_path).await;
            return Err(ConverterError::Io(e));
        }

        info!(
            job_id = %control.job_id(),
            stages = chain.stages().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Applied {:.2}x tempo to {}",
            multiplier,
            path.display()
        );
        Ok(())
    }

    async fn has_artwork(&self, path: &Path) -> bool {
        let output = Command::new(&self.config.ffprobe_path)
            .args(Self::build_probe_artwork_args(path))
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                !String::from_utf8_lossy(&output.stdout).trim().is_empty()
            }
            Ok(_) => false,
            Err(e) => {
                debug!("ffprobe failed for {}: {}", path.display(), e);
                false
            }
        }
    }

    async fn extract_artwork(&self, path: &Path) -> Result<Artwork, ConverterError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffmpeg_path)
            .args(Self::build_extract_artwork_args(path))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(ConverterError::ArtworkNotFound {
                path: path.to_path_buf(),
            });
        }

        Ok(Artwork::from_bytes(output.stdout))
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Err(e) = Self::check_binary(&self.config.ffmpeg_path).await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        if let Err(e) = Self::check_binary(&self.config.ffprobe_path).await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        Ok(())
    }
}
