use crate::config::{AnalyzerBackend, GatewayConfig};
use crate::handlers;
use crate::services::{
    AzureDocumentAnalyzer, DocumentAnalyzer, Downloader, MockDocumentAnalyzer, TextExtractor,
};
use axum::{
    extract::Request,
    middleware::from_fn,
    routing::{get, post},
    Router, ServiceExt,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub downloader: Downloader,
    pub extractor: TextExtractor,
}

impl AppState {
    pub fn new(config: GatewayConfig, analyzer: Arc<dyn DocumentAnalyzer>) -> Self {
        Self {
            downloader: Downloader::new(&config.download),
            extractor: TextExtractor::new(analyzer, config.extraction.clone()),
            config,
        }
    }
}

/// Build the analysis backend selected by configuration.
pub fn build_analyzer(config: &GatewayConfig) -> Result<Arc<dyn DocumentAnalyzer>, AppError> {
    match config.analyzer.backend {
        AnalyzerBackend::Azure => {
            let analyzer = AzureDocumentAnalyzer::new(config.analyzer.azure.clone())?;
            tracing::info!(
                endpoint = %config.analyzer.azure.endpoint,
                api_version = %config.analyzer.azure.api_version,
                "Azure document analyzer initialized"
            );
            Ok(Arc::new(analyzer))
        }
        AnalyzerBackend::Mock => {
            tracing::warn!("Using mock document analyzer - extracted text is synthetic");
            Ok(Arc::new(MockDocumentAnalyzer::default()))
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::root).fallback(handlers::route_not_found),
        )
        .route(
            "/status",
            get(handlers::status).fallback(handlers::route_not_found),
        )
        .route(
            "/metrics",
            get(handlers::metrics).fallback(handlers::route_not_found),
        )
        .route(
            "/download",
            post(handlers::download_file).fallback(handlers::download_method_not_allowed),
        )
        .route(
            "/extract-text",
            post(handlers::extract_text).fallback(handlers::extract_method_not_allowed),
        )
        .fallback(handlers::route_not_found)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}

/// The router behind a trailing-slash trim, so `/status/` routes as `/status`.
///
/// Path matching stays case-sensitive.
pub fn app(state: AppState) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(router(state))
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let analyzer = build_analyzer(&config).map_err(|e| {
            tracing::error!("Failed to initialize document analyzer: {}", e);
            e
        })?;

        Self::build_with_analyzer(config, analyzer).await
    }

    /// Build with an explicit analysis backend instead of the configured one.
    pub async fn build_with_analyzer(
        config: GatewayConfig,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> Result<Self, AppError> {
        let addr = config.common.address();
        let service = app(AppState::new(config, analyzer));

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, ServiceExt::<Request>::into_make_service(service));

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalyzerConfig, AzureConfig, DownloadConfig, ExtractionConfig};
    use axum::body::Body;
    use axum::http::{header, Method, StatusCode};
    use http_body_util::BodyExt;
    use secrecy::Secret;
    use serde_json::{json, Value};
    use service_core::config::Config;
    use tower::ServiceExt as _;

    fn test_app() -> NormalizePath<Router> {
        let config = GatewayConfig {
            common: Config::default(),
            analyzer: AnalyzerConfig {
                backend: AnalyzerBackend::Mock,
                azure: AzureConfig {
                    endpoint: String::new(),
                    api_key: Secret::new(String::new()),
                    api_version: "2023-07-31".to_string(),
                    request_timeout_secs: 5,
                },
            },
            download: DownloadConfig {
                base_dir: "target/startup-test".into(),
                program: "ocr-gateway-missing-downloader".to_string(),
                timeout_secs: 5,
            },
            extraction: ExtractionConfig {
                model_id: crate::config::READ_MODEL_ID.to_string(),
                poll_interval_ms: 10,
                max_poll_interval_ms: 50,
                max_wait_secs: 5,
            },
        };
        app(AppState::new(config, Arc::new(MockDocumentAnalyzer::default())))
    }

    async fn send(method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn trailing_slash_reaches_the_same_route() {
        let (status, body) = send(Method::GET, "/status/", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "message": "API is running!" }));

        let (status, _) = send(Method::GET, "/download/", Body::empty()).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn root_is_unaffected_by_slash_trimming() {
        let (status, body) = send(Method::GET, "/", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Hello, welcome to the API!");
    }

    #[tokio::test]
    async fn empty_json_body_reports_missing_field() {
        let (status, body) = send(Method::POST, "/extract-text", Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "error": "Missing filePath in request body." }));
    }

    #[tokio::test]
    async fn paths_are_case_sensitive() {
        let (status, _) = send(Method::GET, "/STATUS", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
