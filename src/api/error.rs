// =============================================================================
// API Errors - JSON `{"error": ...}` responses
// =============================================================================

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::indicators::IndicatorError;
use crate::ingest::IngestError;

/// Error returned by a request handler.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - the request itself is unusable.
    BadRequest(String),
    /// 413 - the request body is over the configured upload limit.
    PayloadTooLarge(String),
    /// 500 - something failed on our side.
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Map a multipart read failure, keeping the body-limit case apart from
    /// a corrupt upload.
    pub fn multipart(context: &str, err: MultipartError) -> Self {
        let message = format!("{context}: {err}");
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::BadRequest(message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => {
                warn!(error = %msg, "request rejected");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::PayloadTooLarge(msg) => {
                warn!(error = %msg, "request body too large");
                (StatusCode::PAYLOAD_TOO_LARGE, msg)
            }
            Self::Internal(msg) => {
                error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MissingCloseColumn => Self::bad_request(r#""Close" column not found"#),
            IngestError::MissingHeader(_) => Self::bad_request("Failed to read CSV header"),
            IngestError::Malformed(_) => Self::bad_request("Failed to parse CSV rows"),
        }
    }
}

impl From<IndicatorError> for ApiError {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::InsufficientData { .. } => Self::bad_request("Not enough Close prices"),
        }
    }
}
