//! Playlist job integration tests.
//!
//! A playlist job downloads everything in one fetcher run, then applies the
//! tempo change to each file that appeared in the working directory.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use tempofetch_core::{
    testing::{MockConverter, MockFetcher},
    FsPlacer, Job, JobKind, JobOrchestrator, JobStatus, OrchestratorConfig, PlacerConfig,
};

const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PLmock123";

struct TestHarness {
    fetcher: Arc<MockFetcher>,
    converter: Arc<MockConverter>,
    placer: Arc<FsPlacer>,
    orchestrator: JobOrchestrator,
    _dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let placer = Arc::new(FsPlacer::new(
            PlacerConfig::default(),
            dir.path().join("temp"),
            dir.path().join("output"),
        ));
        placer.ensure_dirs().await.expect("Failed to create dirs");

        let fetcher = Arc::new(MockFetcher::new());
        let converter = Arc::new(MockConverter::new());
        let orchestrator = JobOrchestrator::new(
            OrchestratorConfig::default(),
            fetcher.clone(),
            converter.clone(),
            placer.clone(),
        );

        Self {
            fetcher,
            converter,
            placer,
            orchestrator,
            _dir: dir,
        }
    }

    async fn set_files(&self, names: &[&str]) {
        self.fetcher
            .set_playlist_files(names.iter().map(|n| n.to_string()).collect())
            .await;
    }

    async fn wait_for_terminal(&self, job_id: &str) -> Job {
        let start = std::time::Instant::now();
        loop {
            let job = self.orchestrator.status(job_id).await.unwrap();
            if job.status.is_terminal() || start.elapsed() > Duration::from_secs(5) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn tempo_file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .converter
            .recorded_tempos()
            .await
            .into_iter()
            .filter_map(|t| t.path.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();
        names.sort();
        names
    }
}

#[tokio::test]
async fn test_playlist_with_speed_processes_every_new_file() {
    let harness = TestHarness::new().await;
    harness.set_files(&["a.mp3", "b.mp3", "c.mp3"]).await;

    let id = harness
        .orchestrator
        .submit(PLAYLIST_URL, Some(1.5))
        .await
        .unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.kind, JobKind::Playlist);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.message, "Downloaded 3 files with 1.5x speed");
    assert_eq!(harness.fetcher.playlist_count().await, 1);
    assert_eq!(harness.fetcher.fetch_count().await, 0);
    assert_eq!(harness.tempo_file_names().await, vec!["a.mp3", "b.mp3", "c.mp3"]);
}

#[tokio::test]
async fn test_one_failed_transform_does_not_abort_batch() {
    let harness = TestHarness::new().await;
    harness.set_files(&["a.mp3", "b.mp3", "c.mp3"]).await;
    harness.converter.fail_for("b.mp3").await;

    let id = harness
        .orchestrator
        .submit(PLAYLIST_URL, Some(2.0))
        .await
        .unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.message.contains("2/3"), "message: {}", job.message);
    assert!(job.message.contains("1 failed"), "message: {}", job.message);

    let tempos = harness.converter.recorded_tempos().await;
    assert_eq!(tempos.len(), 3);
    assert_eq!(tempos.iter().filter(|t| t.success).count(), 2);
}

#[tokio::test]
async fn test_preexisting_files_are_not_processed() {
    let harness = TestHarness::new().await;
    std::fs::write(harness.placer.temp_dir().join("old.mp3"), b"old").unwrap();
    harness.set_files(&["new1.mp3", "new2.mp3"]).await;

    let id = harness
        .orchestrator
        .submit(PLAYLIST_URL, Some(2.5))
        .await
        .unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.message, "Downloaded 2 files with 2.5x speed");
    assert_eq!(harness.tempo_file_names().await, vec!["new1.mp3", "new2.mp3"]);
}

#[tokio::test]
async fn test_identity_speed_skips_processing() {
    let harness = TestHarness::new().await;
    harness.set_files(&["a.mp3", "b.mp3"]).await;

    let id = harness.orchestrator.submit(PLAYLIST_URL, None).await.unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.message, "Downloaded 2 files");
    assert_eq!(harness.converter.tempo_count().await, 0);
}

#[tokio::test]
async fn test_fetch_error_without_files_fails_job() {
    let harness = TestHarness::new().await;
    harness
        .fetcher
        .set_playlist_error("ERROR: This playlist does not exist")
        .await;

    let id = harness
        .orchestrator
        .submit(PLAYLIST_URL, Some(1.5))
        .await
        .unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    assert!(job.message.starts_with("Playlist download error: "));
    assert!(job.message.contains("does not exist"));
}

#[tokio::test]
async fn test_fetch_error_with_files_keeps_going() {
    let harness = TestHarness::new().await;
    harness.set_files(&["a.mp3", "b.mp3"]).await;
    harness
        .fetcher
        .set_playlist_error("ERROR: [youtube] xyz: Video unavailable")
        .await;

    let id = harness
        .orchestrator
        .submit(PLAYLIST_URL, Some(1.5))
        .await
        .unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(harness.converter.tempo_count().await, 2);
}

#[tokio::test]
async fn test_shutdown_between_files_stops_batch() {
    let harness = TestHarness::new().await;
    harness.set_files(&["a.mp3", "b.mp3", "c.mp3"]).await;
    harness
        .converter
        .set_duration(Duration::from_millis(200))
        .await;

    let id = harness
        .orchestrator
        .submit(PLAYLIST_URL, Some(3.0))
        .await
        .unwrap();

    let start = std::time::Instant::now();
    while harness.orchestrator.status(&id).await.unwrap().status != JobStatus::Processing {
        assert!(start.elapsed() < Duration::from_secs(5), "job never started processing");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    harness.orchestrator.shutdown();

    let job = harness.wait_for_terminal(&id).await;
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(
        job.message.starts_with("Cancelled after processing"),
        "message: {}",
        job.message
    );
    assert!(harness.converter.tempo_count().await < 3);
}
