//! File system placer implementation.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

use super::config::PlacerConfig;
use super::error::PlacerError;
use super::types::{ArtifactEntry, ArtifactLocation, MoveReport};

/// Extension of the audio artifacts this system produces.
const ARTIFACT_EXTENSION: &str = ".mp3";

/// Suffix of the sibling file a tempo transform writes before it replaces
/// the original. Such files are never artifacts.
pub const PARTIAL_SUFFIX: &str = ".tmp.mp3";

/// Whether `name` looks like a finished audio artifact.
pub fn is_artifact(name: &str) -> bool {
    let name = name.to_lowercase();
    name.ends_with(ARTIFACT_EXTENSION) && !name.ends_with(PARTIAL_SUFFIX)
}

/// Manages the working and destination directories.
///
/// Both directories are flat and shared between concurrently running jobs
/// and HTTP requests.
#[derive(Debug, Clone)]
pub struct FsPlacer {
    config: PlacerConfig,
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl FsPlacer {
    /// Creates a placer over the given working and destination directories.
    pub fn new(
        config: PlacerConfig,
        temp_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn dir(&self, location: ArtifactLocation) -> &Path {
        match location {
            ArtifactLocation::Temp => &self.temp_dir,
            ArtifactLocation::Output => &self.output_dir,
        }
    }

    /// Creates both directories if they do not exist yet.
    pub async fn ensure_dirs(&self) -> Result<(), PlacerError> {
        fs::create_dir_all(&self.temp_dir).await?;
        fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    /// Joins `name` onto the directory of `location`.
    ///
    /// The name must be a single plain path component; anything that could
    /// escape the directory is rejected.
    pub fn resolve(&self, location: ArtifactLocation, name: &str) -> Result<PathBuf, PlacerError> {
        let invalid = || PlacerError::InvalidName {
            name: name.to_string(),
        };

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if part == name => {}
            _ => return Err(invalid()),
        }
        if name.contains('\\') {
            return Err(invalid());
        }

        Ok(self.dir(location).join(name))
    }

    /// Lists artifacts in `location`, newest first.
    ///
    /// A missing directory yields an empty list.
    pub async fn scan(
        &self,
        location: ArtifactLocation,
    ) -> Result<Vec<ArtifactEntry>, PlacerError> {
        let mut entries = Vec::new();
        for (name, metadata) in Self::read_artifacts(self.dir(location)).await? {
            entries.push(ArtifactEntry {
                name,
                size_bytes: metadata.len(),
                modified: unix_seconds(metadata.modified().ok()),
            });
        }
        entries.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    /// Names of all artifacts currently in `location`, sorted.
    pub async fn snapshot(
        &self,
        location: ArtifactLocation,
    ) -> Result<BTreeSet<String>, PlacerError> {
        Ok(Self::read_artifacts(self.dir(location))
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// The most recently modified artifact in `location`, if any.
    pub async fn newest_artifact(
        &self,
        location: ArtifactLocation,
    ) -> Result<Option<PathBuf>, PlacerError> {
        let dir = self.dir(location);
        let newest = Self::read_artifacts(dir)
            .await?
            .into_iter()
            .filter_map(|(name, metadata)| metadata.modified().ok().map(|time| (time, name)))
            .max();
        Ok(newest.map(|(_, name)| dir.join(name)))
    }

    /// Deletes an artifact. Only the working area may be cleaned up.
    pub async fn delete_artifact(
        &self,
        location: ArtifactLocation,
        name: &str,
    ) -> Result<(), PlacerError> {
        if location != ArtifactLocation::Temp {
            return Err(PlacerError::Forbidden {
                reason: format!("Cannot delete from {} directory", location),
            });
        }
        let path = self.resolve(location, name)?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound { path: path.clone() }
            } else {
                PlacerError::Io(e)
            }
        })?;
        info!("Deleted {}", path.display());
        Ok(())
    }

    /// Moves each named artifact from temp to output.
    ///
    /// Failures are collected per file; one bad file never stops the batch.
    pub async fn move_artifacts(&self, names: &[String]) -> MoveReport {
        let mut report = MoveReport::default();

        for name in names {
            let paths = self
                .resolve(ArtifactLocation::Temp, name)
                .and_then(|src| Ok((src, self.resolve(ArtifactLocation::Output, name)?)));
            let (source, destination) = match paths {
                Ok(paths) => paths,
                Err(_) => {
                    report.errors.push(format!("{}: Invalid path", name));
                    continue;
                }
            };

            if !is_artifact(name) {
                report.errors.push(format!("{}: Not an audio file", name));
                continue;
            }

            if !fs::try_exists(&source).await.unwrap_or(false) {
                report.errors.push(format!("{}: File not found in temp", name));
                continue;
            }

            match self.move_file(&source, &destination).await {
                Ok(()) => report.moved += 1,
                // The data reached the destination; count it and report the leftover.
                Err(e @ PlacerError::CleanupFailed { .. }) => {
                    report.moved += 1;
                    report.errors.push(format!("{}: {}", name, e));
                }
                Err(e) => report.errors.push(format!("{}: {}", name, e)),
            }
        }

        info!(
            "Moved {}/{} files to {}",
            report.moved,
            names.len(),
            self.output_dir.display()
        );
        report
    }

    /// Moves a single file, falling back to copy and delete when a rename
    /// crosses devices. The copy is synced to disk before the source goes.
    pub async fn move_file(&self, source: &Path, destination: &Path) -> Result<(), PlacerError> {
        if self.config.prefer_atomic_moves {
            match Self::try_atomic_move(source, destination).await {
                Ok(true) => {
                    debug!("Renamed {} -> {}", source.display(), destination.display());
                    return Ok(());
                }
                Ok(false) => {
                    debug!(
                        "Cross-device move for {}, copying instead",
                        source.display()
                    );
                }
                Err(e) => {
                    return Err(PlacerError::move_failed(
                        source.to_path_buf(),
                        destination.to_path_buf(),
                        e,
                    ))
                }
            }
        }

        self.copy_file(source, destination).await?;

        fs::remove_file(source).await.map_err(|e| {
            warn!("Failed to remove {} after copy: {}", source.display(), e);
            PlacerError::CleanupFailed {
                path: source.to_path_buf(),
                source: e,
            }
        })?;

        Ok(())
    }

    /// Attempts to move a file atomically (rename).
    ///
    /// `Ok(false)` means the rename crossed a filesystem boundary.
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // EXDEV is 18 on Linux
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a file and fsyncs the destination.
    async fn copy_file(&self, source: &Path, destination: &Path) -> Result<u64, PlacerError> {
        let copy_failed =
            |e| PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e);

        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;
        let dest_file = File::create(destination).await.map_err(copy_failed)?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);

        let result = async {
            let bytes = tokio::io::copy_buf(&mut reader, &mut writer).await?;
            writer.flush().await?;
            writer.get_mut().sync_all().await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;

        match result {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(destination).await {
                    warn!(
                        "Failed to clean up partial copy {}: {}",
                        destination.display(),
                        cleanup
                    );
                }
                Err(copy_failed(e))
            }
        }
    }

    async fn read_artifacts(
        dir: &Path,
    ) -> Result<Vec<(String, std::fs::Metadata)>, PlacerError> {
        let mut read_dir = match fs::read_dir(dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PlacerError::Io(e)),
        };

        let mut artifacts = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_artifact(&name) {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if metadata.is_file() {
                artifacts.push((name, metadata));
            }
        }
        Ok(artifacts)
    }
}

fn unix_seconds(time: Option<SystemTime>) -> i64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
