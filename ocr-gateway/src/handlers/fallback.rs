//! Responses for requests that reach no operation handler.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

fn method_not_allowed(url: &str, body: Value) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "Method Not Allowed",
            "message": "Please use POST to access this endpoint.",
            "example": {
                "method": "POST",
                "url": url,
                "body": body
            }
        })),
    )
}

pub async fn download_method_not_allowed() -> impl IntoResponse {
    method_not_allowed(
        "/download",
        json!({ "fileUrl": "<url>", "fileName": "<filename.pdf>" }),
    )
}

pub async fn extract_method_not_allowed() -> impl IntoResponse {
    method_not_allowed("/extract-text", json!({ "filePath": "<path-to-file>" }))
}

pub async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found." })),
    )
}
