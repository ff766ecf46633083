//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock tools injected, so the HTTP surface can be exercised without
//! yt-dlp or ffmpeg installed.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tempofetch_core::{
    testing::{MockConverter, MockFetcher},
    Config, FsPlacer, JobOrchestrator, PlacerConfig,
};
use tempofetch_server::{create_router, AppState};

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_download() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/download", json!({
///         "url": "https://youtu.be/dQw4w9WgXcQ",
///         "speed": 1.5
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - control downloads and previews
    pub fetcher: Arc<MockFetcher>,
    /// Mock converter - control tempo changes and artwork
    pub converter: Arc<MockConverter>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub temp_path: PathBuf,
    pub output_path: PathBuf,
    /// Keeps the storage and static directories alive
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with the raw body, for non-JSON endpoints
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().join("temp");
        let output_path = temp_dir.path().join("output");
        let static_path = temp_dir.path().join("static");

        std::fs::create_dir_all(&static_path).expect("Failed to create static dir");
        std::fs::write(
            static_path.join("index.html"),
            "<!doctype html><title>tempofetch</title>",
        )
        .expect("Failed to write index");

        let mut config = Config::default();
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        config.server.port = 0; // Not used for in-process testing
        config.server.static_dir = static_path;
        config.storage.temp_dir = temp_path.clone();
        config.storage.output_dir = output_path.clone();

        let placer = FsPlacer::new(PlacerConfig::default(), &temp_path, &output_path);
        placer.ensure_dirs().await.expect("Failed to create storage dirs");

        let fetcher = Arc::new(MockFetcher::new());
        let converter = Arc::new(MockConverter::new());
        let orchestrator = Arc::new(JobOrchestrator::new(
            config.orchestrator.clone(),
            fetcher.clone(),
            converter.clone(),
            Arc::new(placer),
        ));

        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator)));
        let router = create_router(state);

        Self {
            router,
            fetcher,
            converter,
            orchestrator,
            temp_path,
            output_path,
            temp_dir,
        }
    }

    /// Write a placeholder artifact into the working directory.
    pub fn add_temp_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write temp file");
        path
    }

    /// Write a placeholder artifact into the output directory.
    pub fn add_output_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.output_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write output file");
        path
    }

    /// Poll `/status/{id}` until the job is terminal.
    pub async fn wait_for_job(&self, id: &str) -> Value {
        let start = std::time::Instant::now();
        loop {
            let response = self.get(&format!("/status/{}", id)).await;
            let status = response.body["status"].as_str().unwrap_or_default().to_string();
            if matches!(status.as_str(), "completed" | "error" | "cancelled")
                || start.elapsed() > Duration::from_secs(5)
            {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: Self::parse_json(&raw.body),
        }
    }

    /// Send a GET request and keep the raw body and headers.
    pub async fn get_raw(&self, path: &str, headers: &[(&str, &str)]) -> RawResponse {
        let mut builder = Request::builder().method("GET").uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let raw = self.send(request_builder.body(body).unwrap()).await;
        TestResponse {
            status: raw.status,
            body: Self::parse_json(&raw.body),
        }
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            headers,
            body,
        }
    }

    fn parse_json(bytes: &[u8]) -> Value {
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(bytes).unwrap_or(Value::Null)
        }
    }
}

/// Assert a response has the expected status, printing the body otherwise.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $expected:expr) => {
        assert_eq!(
            $response.status, $expected,
            "unexpected status, body: {}",
            $response.body
        );
    };
}
