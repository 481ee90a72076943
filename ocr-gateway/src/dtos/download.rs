use super::first_message;
use crate::error::FailureCause;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

const MISSING_FIELDS: &str = "Missing fileUrl or fileName in request body.";
const NOT_A_PDF: &str = "Invalid fileName. Only PDF files are allowed.";
const NOT_A_PLAIN_NAME: &str = "Invalid fileName. Path separators are not allowed.";
const INVALID_URL: &str = "Invalid fileUrl.";

/// Raw `POST /download` body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DownloadPayload {
    #[validate(
        required(message = "Missing fileUrl or fileName in request body."),
        length(min = 1, message = "Missing fileUrl or fileName in request body.")
    )]
    pub file_url: Option<String>,

    #[validate(
        required(message = "Missing fileUrl or fileName in request body."),
        length(min = 1, message = "Missing fileUrl or fileName in request body.")
    )]
    pub file_name: Option<String>,
}

/// A download that passed validation and may be handed to the downloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub file_url: String,
    pub file_name: String,
}

impl TryFrom<DownloadPayload> for DownloadRequest {
    type Error = FailureCause;

    fn try_from(payload: DownloadPayload) -> Result<Self, Self::Error> {
        payload
            .validate()
            .map_err(|e| FailureCause::Validation(first_message(&e, MISSING_FIELDS)))?;

        let (Some(file_url), Some(file_name)) = (payload.file_url, payload.file_name) else {
            return Err(FailureCause::Validation(MISSING_FIELDS.to_string()));
        };

        if !file_name.ends_with(".pdf") {
            return Err(FailureCause::Validation(NOT_A_PDF.to_string()));
        }

        // The name is joined onto the download directory and must stay inside it.
        if file_name.contains('/') || file_name.contains('\\') {
            return Err(FailureCause::Validation(NOT_A_PLAIN_NAME.to_string()));
        }

        // A leading dash would be read as a downloader option.
        if file_url.starts_with('-') {
            return Err(FailureCause::Validation(INVALID_URL.to_string()));
        }

        Ok(Self {
            file_url,
            file_name,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub message: String,
    pub file_path: PathBuf,
}

impl DownloadResponse {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            message: "File downloaded successfully.".to_string(),
            file_path,
        }
    }
}
