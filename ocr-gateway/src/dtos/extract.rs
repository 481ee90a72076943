use super::first_message;
use crate::error::FailureCause;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Component, Path, PathBuf};
use validator::Validate;

const MISSING_PATH: &str = "Missing filePath in request body.";
const NOT_A_PDF: &str = "Invalid filePath. Only PDF files are allowed.";

/// Raw `POST /extract-text` body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExtractPayload {
    #[validate(
        required(message = "Missing filePath in request body."),
        length(min = 1, message = "Missing filePath in request body.")
    )]
    pub file_path: Option<String>,
}

/// An extraction whose file exists locally, with its path made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub file_path: PathBuf,
}

impl ExtractRequest {
    /// Validate the payload and confirm the file exists.
    ///
    /// Relative paths resolve against the working directory of the process.
    pub async fn from_payload(payload: ExtractPayload) -> Result<Self, FailureCause> {
        payload
            .validate()
            .map_err(|e| FailureCause::Validation(first_message(&e, MISSING_PATH)))?;

        let Some(file_path) = payload.file_path else {
            return Err(FailureCause::Validation(MISSING_PATH.to_string()));
        };

        if !file_path.ends_with(".pdf") {
            return Err(FailureCause::Validation(NOT_A_PDF.to_string()));
        }

        let absolute = resolve(&file_path)
            .map_err(|e| FailureCause::Validation(format!("Invalid filePath: {}", e)))?;

        match tokio::fs::try_exists(&absolute).await {
            Ok(true) => Ok(Self {
                file_path: absolute,
            }),
            _ => Err(FailureCause::FileNotFound(absolute)),
        }
    }
}

/// Make `path` absolute against the working directory and fold away `.` and
/// `..` lexically. `..` at the root stays at the root.
fn resolve(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub message: String,
    pub data: String,
}

impl ExtractResponse {
    pub fn new(data: String) -> Self {
        Self {
            message: "Text extracted successfully.".to_string(),
            data,
        }
    }
}
