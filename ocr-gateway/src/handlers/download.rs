use crate::dtos::{DownloadPayload, DownloadRequest, DownloadResponse, JsonPayload};
use crate::error::FailureCause;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};

pub async fn download_file(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<DownloadPayload>,
) -> Result<impl IntoResponse, FailureCause> {
    let request = DownloadRequest::try_from(payload).map_err(|e| {
        tracing::warn!(error = %e, "Rejected download request");
        e
    })?;

    let file_path = state.downloader.download(&request).await?;

    Ok(Json(DownloadResponse::new(file_path)))
}
