//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job lifecycle (submissions, terminal states)
//! - yt-dlp download attempts per target strategy
//! - ffmpeg tempo transforms

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs accepted by kind.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tempofetch_jobs_submitted_total", "Total jobs accepted"),
        &["kind"], // "single", "playlist"
    )
    .unwrap()
});

/// Jobs that reached a terminal state.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tempofetch_jobs_finished_total",
            "Total jobs that reached a terminal state",
        ),
        &["status"], // "completed", "error", "cancelled"
    )
    .unwrap()
});

/// Wall time from job start to terminal state.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("tempofetch_job_duration_seconds", "Duration of a job run")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 900.0, 1800.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Tools
// =============================================================================

/// yt-dlp single-video attempts.
pub static FETCH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tempofetch_fetch_attempts_total", "Total yt-dlp download attempts"),
        &["strategy", "result"], // "resolved_id"/"full_url", "success"/"failure"
    )
    .unwrap()
});

/// ffmpeg tempo transforms by result.
pub static TEMPO_TRANSFORMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tempofetch_tempo_transforms_total",
            "Total ffmpeg tempo transforms",
        ),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Tools
        Box::new(FETCH_ATTEMPTS.clone()),
        Box::new(TEMPO_TRANSFORMS.clone()),
    ]
}
