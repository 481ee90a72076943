use crate::services::get_metrics;
use axum::{http::header, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> &'static str {
    "Hello, welcome to the API!"
}

/// Liveness only: never calls the downloader or the analysis backend.
pub async fn status() -> impl IntoResponse {
    Json(json!({ "message": "API is running!" }))
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
