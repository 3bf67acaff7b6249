//! API error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use invx_core::{InvxError, StorageError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request.
    #[error("{0}")]
    BadRequest(String),

    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Extraction failed; the message is shown to the client.
    #[error("{0}")]
    Extraction(String),

    #[error(transparent)]
    Core(#[from] InvxError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Core(err.into())
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, String, &'static str) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::Extraction(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "EXTRACTION_ERROR")
            }
            ApiError::Core(err) => match err {
                InvxError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
                InvxError::Storage(StorageError::InvalidName(_)) => (
                    StatusCode::BAD_REQUEST,
                    "Invalid file name".to_string(),
                    "INVALID_NAME",
                ),
                InvxError::Storage(StorageError::NotFound(_)) => (
                    StatusCode::NOT_FOUND,
                    "File not found".to_string(),
                    "NOT_FOUND",
                ),
                InvxError::RecordNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "Invoice not found".to_string(),
                    "NOT_FOUND",
                ),
                InvxError::Extraction(e) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "EXTRACTION_ERROR")
                }
                other => {
                    error!(error = %other, "Request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                        "INTERNAL_ERROR",
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, code) = self.parts();
        (
            status,
            Json(ErrorResponse {
                error,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Core(InvxError::Validation("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::InvalidName("../x".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::NotFound("x".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Core(InvxError::RecordNotFound("id".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Core(InvxError::Config("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let (_, msg, code) = ApiError::Core(InvxError::Config("secret path".into())).parts();
        assert_eq!(msg, "Internal server error");
        assert_eq!(code, "INTERNAL_ERROR");
    }
}
