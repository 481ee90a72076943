//! Azure AI Document Intelligence (Form Recognizer) REST client.
//!
//! Submission is `POST {endpoint}/formrecognizer/documentModels/{model}:analyze`
//! with the raw document as the body; the service answers `202 Accepted`
//! with an `Operation-Location` header, which is then polled with `GET`
//! until its `status` leaves `notStarted`/`running`.

use super::{
    AnalysisDocument, AnalysisError, DocumentAnalyzer, DocumentStream, OperationHandle,
    OperationStatus,
};
use crate::config::AzureConfig;
use async_trait::async_trait;
use reqwest::{header, Body, Client, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::error::AppError;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "Operation-Location";

/// Analyzer backed by an Azure Document Intelligence resource.
#[derive(Clone)]
pub struct AzureDocumentAnalyzer {
    client: Client,
    config: AzureConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: OperationState,
    analyze_result: Option<AnalysisDocument>,
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
enum OperationState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl AzureDocumentAnalyzer {
    pub fn new(config: AzureConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

        Ok(Self { client, config })
    }

    /// Build the analyze URL for the given model.
    fn analyze_url(&self, model_id: &str) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            model_id,
            self.config.api_version
        )
    }

    fn api_key(&self) -> &str {
        self.config.api_key.expose_secret()
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureDocumentAnalyzer {
    async fn submit(
        &self,
        model_id: &str,
        document: DocumentStream,
    ) -> Result<OperationHandle, AnalysisError> {
        let url = self.analyze_url(model_id);

        tracing::debug!(model_id = %model_id, "Submitting document for analysis");

        let response = self
            .client
            .post(&url)
            .header(SUBSCRIPTION_KEY_HEADER, self.api_key())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::wrap_stream(document))
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let location = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AnalysisError::InvalidResponse(
                    "Analyze response did not include an Operation-Location header.".to_string(),
                )
            })?;

        tracing::debug!(operation = %location, "Analysis accepted");

        Ok(OperationHandle::new(location))
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, AnalysisError> {
        let response = self
            .client
            .get(handle.as_str())
            .header(SUBSCRIPTION_KEY_HEADER, self.api_key())
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let operation: AnalyzeOperation = response.json().await.map_err(|e| {
            AnalysisError::InvalidResponse(format!("Failed to parse analysis result: {}", e))
        })?;

        match operation.status {
            OperationState::NotStarted | OperationState::Running => Ok(OperationStatus::Running),
            // A result without a body has no pages, which the extractor reports as no content.
            OperationState::Succeeded => Ok(OperationStatus::Succeeded(
                operation.analyze_result.unwrap_or_default(),
            )),
            OperationState::Failed | OperationState::Unknown => {
                let message = operation
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "Document analysis operation failed.".to_string());
                tracing::warn!(operation = %handle.as_str(), error = %message, "Analysis failed");
                Err(AnalysisError::OperationFailed(message))
            }
        }
    }
}

/// Turn a non-success response into an error, preferring the service's own message.
async fn api_error(response: Response) -> AnalysisError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => {
            tracing::warn!(
                status = %status,
                code = ?envelope.error.code,
                error = %envelope.error.message,
                "Document analysis API error"
            );
            AnalysisError::Api(envelope.error.message)
        }
        Err(_) => AnalysisError::Api(format!(
            "Document analysis API error {}: {}",
            status, body
        )),
    }
}
