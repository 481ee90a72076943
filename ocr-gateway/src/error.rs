//! Request-level failures and their HTTP rendering.
//!
//! Every handler returns `Result<_, FailureCause>`; the `IntoResponse`
//! impl below is the single place where failures become status codes and
//! JSON bodies. Internal diagnostics (downloader stderr, backend payloads)
//! are logged by the components that produce them and are only surfaced to
//! the client where the response contract asks for it.

use crate::services::analysis::AnalysisError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DOWNLOAD_FAILED: &str = "Failed to download the file.";
pub const EXTRACTION_FAILED: &str = "Failed to extract text from the file.";

#[derive(Debug, Error)]
pub enum FailureCause {
    /// Malformed or incomplete client input.
    #[error("{0}")]
    Validation(String),

    /// The referenced local file is absent.
    #[error("File does not exist at path: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The external downloader could not be spawned, failed or timed out.
    #[error("Download process failed: {0}")]
    ProcessExecution(String),

    /// The analysis backend call failed or returned unusable content.
    #[error("{0}")]
    Backend(String),
}

impl From<AnalysisError> for FailureCause {
    fn from(err: AnalysisError) -> Self {
        FailureCause::Backend(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for FailureCause {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            FailureCause::Validation(message) => (StatusCode::BAD_REQUEST, message, None),
            err @ FailureCause::FileNotFound(_) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            FailureCause::ProcessExecution(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                DOWNLOAD_FAILED.to_string(),
                None,
            ),
            FailureCause::Backend(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                EXTRACTION_FAILED.to_string(),
                Some(message),
            ),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}
