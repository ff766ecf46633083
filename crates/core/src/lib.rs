pub mod config;
pub mod converter;
pub mod fetcher;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod placer;
pub mod process;
pub mod tempo;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{Artwork, Converter, ConverterConfig, ConverterError, FfmpegConverter};
pub use fetcher::{
    FetchError, FetchOutput, FetchTarget, FetcherConfig, MediaFetcher, MediaInfo, MediaKind,
    PlaylistMember, YtDlpFetcher,
};
pub use job::{Job, JobControl, JobError, JobEvent, JobKind, JobRegistry, JobStatus};
pub use orchestrator::{
    ArtifactInfo, ArtifactListing, JobOrchestrator, OrchestratorConfig, OrchestratorError,
};
pub use placer::{ArtifactLocation, FsPlacer, MoveReport, PlacerConfig, PlacerError};
pub use tempo::{TempoChain, TempoError};
