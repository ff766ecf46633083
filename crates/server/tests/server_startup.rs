use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::TempDir;
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Write a minimal valid config with storage inside `root`
fn write_config(root: &Path, port: u16) -> std::path::PathBuf {
    let static_dir = root.join("static");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("index.html"), "<title>tempofetch</title>").unwrap();

    let content = format!(
        r#"
[server]
host = "127.0.0.1"
port = {}
static_dir = '{}'

[storage]
temp_dir = '{}'
output_dir = '{}'
"#,
        port,
        static_dir.display(),
        root.join("temp").display(),
        root.join("output").display(),
    );
    let path = root.join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

/// Spawn the server and return a handle
fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_tempofetch"))
        .env("TEMPOFETCH_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config_path = write_config(dir.path(), port);

    let mut server = spawn_server(&config_path);

    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    // Storage directories are created on startup
    assert!(dir.path().join("temp").is_dir());
    assert!(dir.path().join("output").is_dir());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_serves_index_for_unknown_paths() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config_path = write_config(dir.path(), port);

    let mut server = spawn_server(&config_path);
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let body = Client::new()
        .get(format!("http://127.0.0.1:{}/library", port))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .unwrap();
    assert!(body.contains("<title>tempofetch</title>"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_invalid_config_exits() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[server]\nport = 0\n").unwrap();

    let status = tokio::time::timeout(
        Duration::from_secs(10),
        spawn_server(&config_path).wait(),
    )
    .await
    .expect("Server did not exit")
    .unwrap();

    assert!(!status.success());
}
