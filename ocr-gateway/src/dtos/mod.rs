pub mod download;
pub mod extract;

pub use download::{DownloadPayload, DownloadRequest, DownloadResponse};
pub use extract::{ExtractPayload, ExtractRequest, ExtractResponse};

use crate::error::FailureCause;
use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::ValidationErrors;

/// Upper bound on buffered request bodies.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// First human-readable message among the field errors, or `fallback`.
pub(crate) fn first_message(errors: &ValidationErrors, fallback: &str) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| fallback.to_string())
}

/// JSON request body whose rejections surface as validation failures.
///
/// A request without a JSON content type, or with an empty body, is treated
/// as an empty object so it reports the missing fields rather than a
/// media-type or parser complaint.
#[derive(Debug)]
pub struct JsonPayload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = FailureCause;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| FailureCause::Validation(e.to_string()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        match Json::<T>::from_request(req, state).await {
            Ok(Json(payload)) => Ok(Self(payload)),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(Self(T::default())),
            Err(rejection) => Err(FailureCause::Validation(rejection.body_text())),
        }
    }
}
