#![allow(dead_code)]

use ocr_gateway::config::{
    AnalyzerBackend, AnalyzerConfig, AzureConfig, DownloadConfig, ExtractionConfig,
    GatewayConfig, READ_MODEL_ID,
};
use ocr_gateway::services::{DocumentAnalyzer, MockDocumentAnalyzer};
use ocr_gateway::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_API_KEY: &str = "test-subscription-key";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub work_dir: PathBuf,
    pub client: reqwest::Client,
}

/// A fresh per-test directory under `target/`.
pub fn work_dir() -> PathBuf {
    let dir = std::path::absolute(format!("target/test-gateway-{}", Uuid::new_v4()))
        .expect("Failed to resolve test directory");
    std::fs::create_dir_all(&dir).expect("Failed to create test directory");
    dir
}

/// Configuration pointing at `work_dir`, using `program` as the downloader.
pub fn test_config(work_dir: &Path, program: &str) -> GatewayConfig {
    GatewayConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port for testing
        },
        analyzer: AnalyzerConfig {
            backend: AnalyzerBackend::Mock,
            azure: AzureConfig {
                endpoint: String::new(),
                api_key: Secret::new(TEST_API_KEY.to_string()),
                api_version: "2023-07-31".to_string(),
                request_timeout_secs: 5,
            },
        },
        download: DownloadConfig {
            base_dir: work_dir.join("downloads"),
            program: program.to_string(),
            timeout_secs: 10,
        },
        extraction: ExtractionConfig {
            model_id: READ_MODEL_ID.to_string(),
            poll_interval_ms: 10,
            max_poll_interval_ms: 50,
            max_wait_secs: 5,
        },
    }
}

impl TestApp {
    /// App with the mock analyzer and `true` as a downloader that always succeeds.
    pub async fn spawn() -> Self {
        let dir = work_dir();
        let config = test_config(&dir, "true");
        Self::spawn_with(config, dir, Arc::new(MockDocumentAnalyzer::default())).await
    }

    pub async fn spawn_with(
        config: GatewayConfig,
        work_dir: PathBuf,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> Self {
        let app = Application::build_with_analyzer(config, analyzer)
            .await
            .expect("Failed to build test application");
        Self::start(app, work_dir).await
    }

    /// App built from configuration alone, as the binary does.
    pub async fn spawn_configured(config: GatewayConfig, work_dir: PathBuf) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        Self::start(app, work_dir).await
    }

    async fn start(app: Application, work_dir: PathBuf) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling the status endpoint
        let client = reqwest::Client::new();
        let status_url = format!("{}/status", address);
        for _ in 0..50 {
            if client.get(&status_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            work_dir,
            client,
        }
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Write a small PDF-looking file inside the work directory.
    pub async fn write_pdf(&self, name: &str) -> PathBuf {
        let path = self.work_dir.join(name);
        tokio::fs::write(&path, b"%PDF-1.7\n1 0 obj << >> endobj\n%%EOF")
            .await
            .expect("Failed to write test PDF");
        path
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.work_dir).await;
    }
}

/// Write an executable shell script and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    let mut permissions = std::fs::metadata(&path)
        .expect("Failed to stat script")
        .permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("Failed to chmod script");
    path
}
