use crate::dtos::{ExtractPayload, ExtractRequest, ExtractResponse, JsonPayload};
use crate::error::FailureCause;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};

pub async fn extract_text(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<ExtractPayload>,
) -> Result<impl IntoResponse, FailureCause> {
    let request = ExtractRequest::from_payload(payload)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected extraction request");
            e
        })?;

    let text = state.extractor.extract(&request).await?;

    Ok(Json(ExtractResponse::new(text)))
}
