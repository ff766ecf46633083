//! Single-video job lifecycle integration tests.
//!
//! These tests drive jobs through the orchestrator with mock tools:
//! queued -> downloading -> (processing) -> completed | error | cancelled

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use tempofetch_core::{
    testing::{MockConverter, MockFetcher},
    FetchTarget, FsPlacer, JobKind, JobOrchestrator, JobRegistry, JobStatus, OrchestratorConfig,
    OrchestratorError, PlacerConfig,
};
use tempofetch_core::orchestrator::JobRunner;

const VIDEO_URL: &str = "https://youtu.be/dQw4w9WgXcQ";

/// Test helper owning the mocks and storage directories.
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

    fn runner(&self, registry: Arc<JobRegistry>) -> JobRunner {
        JobRunner::new(
            OrchestratorConfig::default(),
            registry,
            self.fetcher.clone(),
            self.converter.clone(),
            self.placer.clone(),
        )
    }

    /// Polls until the job reaches `status` or the timeout elapses.
    async fn wait_for_status(&self, job_id: &str, status: JobStatus, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if let Ok(job) = self.orchestrator.status(job_id).await {
                if job.status == status {
                    return true;
                }
                if job.status.is_terminal() {
                    return false;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    async fn wait_for_terminal(&self, job_id: &str) -> tempofetch_core::Job {
        let start = std::time::Instant::now();
        loop {
            let job = self.orchestrator.status(job_id).await.unwrap();
            if job.status.is_terminal() || start.elapsed() > Duration::from_secs(5) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[tokio::test]
async fn test_cancel_before_start_invokes_no_process() {
    let harness = TestHarness::new().await;
    let registry = Arc::new(JobRegistry::default());
    let runner = harness.runner(registry.clone());

    let token = CancellationToken::new();
    let id = registry
        .create(VIDEO_URL, 1.5, JobKind::Single, token.clone())
        .await;
    registry.request_cancel(&id).await.unwrap();

    runner
        .run(id.clone(), VIDEO_URL.to_string(), 1.5, JobKind::Single, token)
        .await;

    let job = registry.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.message, "Job cancelled by user");
    assert_eq!(harness.fetcher.fetch_count().await, 0);
    assert_eq!(harness.converter.tempo_count().await, 0);
}

#[tokio::test]
async fn test_shutdown_before_start_marks_cancelled() {
    let harness = TestHarness::new().await;
    let registry = Arc::new(JobRegistry::default());
    let runner = harness.runner(registry.clone());

    let root = CancellationToken::new();
    let token = root.child_token();
    let id = registry
        .create(VIDEO_URL, 1.0, JobKind::Single, token.clone())
        .await;
    root.cancel();

    runner
        .run(id.clone(), VIDEO_URL.to_string(), 1.0, JobKind::Single, token)
        .await;

    let job = registry.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.message, "Job cancelled before starting");
    assert_eq!(harness.fetcher.fetch_count().await, 0);
}

#[tokio::test]
async fn test_speed_job_passes_through_processing() {
    let harness = TestHarness::new().await;
    let mut events = harness.orchestrator.subscribe();

    let id = harness
        .orchestrator
        .submit(VIDEO_URL, Some(1.7))
        .await
        .unwrap();

    let mut statuses = Vec::new();
    let collect = async {
        loop {
            let event = events.recv().await.unwrap();
            if event.job_id != id {
                continue;
            }
            if statuses.last() != Some(&event.status) {
                statuses.push(event.status);
            }
            if event.status.is_terminal() {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), collect)
        .await
        .expect("job did not finish");

    assert_eq!(
        statuses,
        vec![
            JobStatus::Queued,
            JobStatus::Downloading,
            JobStatus::Processing,
            JobStatus::Completed
        ]
    );

    let job = harness.orchestrator.status(&id).await.unwrap();
    assert_eq!(job.message, "Download completed with 1.7x speed");
    assert_eq!(job.speed, 1.7);
    assert_eq!(job.kind, JobKind::Single);

    let tempos = harness.converter.recorded_tempos().await;
    assert_eq!(tempos.len(), 1);
    assert_eq!(tempos[0].multiplier, 1.7);
    assert_eq!(tempos[0].path, harness.placer.temp_dir().join("Mock Song.mp3"));
}

#[tokio::test]
async fn test_identity_speed_skips_processing() {
    let harness = TestHarness::new().await;

    let id = harness.orchestrator.submit(VIDEO_URL, Some(0.0)).await.unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.message, "Download completed");
    assert_eq!(job.speed, 1.0);
    assert_eq!(harness.converter.tempo_count().await, 0);
}

#[tokio::test]
async fn test_failed_primary_retries_with_full_url() {
    let harness = TestHarness::new().await;
    harness.fetcher.set_failing_attempts(1).await;

    let id = harness.orchestrator.submit(VIDEO_URL, Some(2.0)).await.unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(
        harness.fetcher.recorded_targets().await,
        vec![
            FetchTarget::Resolved("dQw4w9WgXcQ".to_string()),
            FetchTarget::FullUrl(VIDEO_URL.to_string()),
        ]
    );
    // The full-URL attempt reports no path; the newest file is used.
    let tempos = harness.converter.recorded_tempos().await;
    assert_eq!(tempos.len(), 1);
    assert_eq!(tempos[0].path, harness.placer.temp_dir().join("Mock Song.mp3"));
}

#[tokio::test]
async fn test_both_attempts_failing_reports_error() {
    let harness = TestHarness::new().await;
    harness.fetcher.set_failing_attempts(2).await;

    let id = harness.orchestrator.submit(VIDEO_URL, None).await.unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    assert!(job.message.contains("mock download failure"));
    assert_eq!(harness.fetcher.fetch_count().await, 2);
}

#[tokio::test]
async fn test_long_tool_diagnostic_is_truncated() {
    let harness = TestHarness::new().await;
    harness.fetcher.set_failing_attempts(2).await;
    let diagnostic = format!("ERROR: {}", "é 日本語 ".repeat(200));
    harness.fetcher.set_failure_diagnostic(diagnostic).await;

    let id = harness.orchestrator.submit(VIDEO_URL, None).await.unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.message.chars().count(), 500);
    assert!(job.message.starts_with("Download failed: ERROR: é 日本語"));
}

#[tokio::test]
async fn test_fallback_ignores_partial_tempo_outputs() {
    let harness = TestHarness::new().await;
    harness.fetcher.set_single_file("Fallback Song.mp3").await;
    harness.fetcher.set_failing_attempts(1).await;

    // Another job's transform is still writing, and its file is the newest.
    let partial = harness.placer.temp_dir().join("Other.mp3.tmp.mp3");
    std::fs::write(&partial, b"half written").unwrap();
    std::fs::File::options()
        .write(true)
        .open(&partial)
        .unwrap()
        .set_modified(std::time::SystemTime::now() + Duration::from_secs(3600))
        .unwrap();

    let id = harness.orchestrator.submit(VIDEO_URL, Some(1.7)).await.unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Completed);
    let tempos = harness.converter.recorded_tempos().await;
    assert_eq!(tempos.len(), 1);
    assert_eq!(
        tempos[0].path,
        harness.placer.temp_dir().join("Fallback Song.mp3")
    );
    assert_eq!(std::fs::read(&partial).unwrap(), b"half written");
}

#[tokio::test]
async fn test_tempo_failure_reports_error() {
    let harness = TestHarness::new().await;
    harness.converter.fail_for("Mock Song.mp3").await;

    let id = harness.orchestrator.submit(VIDEO_URL, Some(1.5)).await.unwrap();
    let job = harness.wait_for_terminal(&id).await;

    assert_eq!(job.status, JobStatus::Error);
    assert!(job.message.starts_with("Failed to adjust speed: "));
}

#[tokio::test]
async fn test_invalid_requests_create_no_job() {
    let harness = TestHarness::new().await;

    for speed in [-1.0, 11.0, f64::NAN] {
        let err = harness
            .orchestrator
            .submit(VIDEO_URL, Some(speed))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Validation(_)));
    }
    let err = harness.orchestrator.submit("", Some(1.0)).await.unwrap_err();
    assert_eq!(err.to_string(), "No URL provided");

    assert!(harness.orchestrator.list().await.is_empty());
    assert_eq!(harness.fetcher.fetch_count().await, 0);
}

#[tokio::test]
async fn test_cancel_stops_running_download() {
    let harness = TestHarness::new().await;
    harness
        .fetcher
        .set_download_delay(Duration::from_secs(60))
        .await;

    let id = harness.orchestrator.submit(VIDEO_URL, Some(1.5)).await.unwrap();
    assert!(
        harness
            .wait_for_status(&id, JobStatus::Downloading, Duration::from_secs(5))
            .await
    );

    harness.orchestrator.cancel(&id).await.unwrap();
    let job = harness.wait_for_terminal(&id).await;
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.message, "Job cancelled by user");

    // Give the runner time to observe the cancel; it must not overwrite it.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let job = harness.orchestrator.status(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(harness.converter.tempo_count().await, 0);

    let err = harness.orchestrator.cancel(&id).await.unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_shutdown_cancels_running_jobs() {
    let harness = TestHarness::new().await;
    harness
        .fetcher
        .set_download_delay(Duration::from_secs(60))
        .await;

    let first = harness.orchestrator.submit(VIDEO_URL, None).await.unwrap();
    let second = harness
        .orchestrator
        .submit("https://www.youtube.com/watch?v=aaaaaaaaaaa", None)
        .await
        .unwrap();
    assert!(
        harness
            .wait_for_status(&second, JobStatus::Downloading, Duration::from_secs(5))
            .await
    );

    assert!(!harness.orchestrator.is_shut_down());
    harness.orchestrator.shutdown();
    assert!(harness.orchestrator.is_shut_down());

    for id in [&first, &second] {
        let job = harness.wait_for_terminal(id).await;
        assert_eq!(job.status, JobStatus::Cancelled);
    }
}

#[tokio::test]
async fn test_jobs_listed_newest_first() {
    let harness = TestHarness::new().await;

    let first = harness.orchestrator.submit(VIDEO_URL, None).await.unwrap();
    let second = harness.orchestrator.submit(VIDEO_URL, None).await.unwrap();

    let ids: Vec<String> = harness
        .orchestrator
        .list()
        .await
        .into_iter()
        .map(|job| job.id)
        .collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let harness = TestHarness::new().await;

    assert!(harness.orchestrator.status("missing").await.unwrap_err().is_not_found());
    assert!(harness.orchestrator.cancel("missing").await.unwrap_err().is_not_found());
}
