// SPDX-License-Identifier: MPL-2.0
//! Request errors and their JSON rendering.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub type WebResult<T> = Result<T, WebError>;

/// Errors returned by the HTTP handlers.
///
/// Every variant renders as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("No file uploaded")]
    NoFile,
    #[error("No file selected")]
    EmptyFilename,
    #[error("Unsupported file format")]
    UnsupportedFormat,
    /// Malformed form field (mode, scale, multipart framing).
    #[error("{message}")]
    BadRequest { status: StatusCode, message: String },
    /// The enhancer exited with a non-zero status.
    #[error("Processing failed: {0}")]
    ProcessFailed(String),
    /// The enhancer succeeded but left no output file.
    #[error("Failed: {0}")]
    OutputMissing(String),
    #[error("Processing timed out")]
    Timeout,
    #[error("File not found")]
    NotFound,
    #[error("{0}")]
    Internal(String),
}

impl WebError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::NoFile | WebError::EmptyFilename | WebError::UnsupportedFormat => {
                StatusCode::BAD_REQUEST
            }
            WebError::BadRequest { status, .. } => *status,
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::ProcessFailed(_)
            | WebError::OutputMissing(_)
            | WebError::Timeout
            | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        WebError::BadRequest {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<MultipartError> for WebError {
    fn from(err: MultipartError) -> Self {
        WebError::BadRequest {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<std::io::Error> for WebError {
    fn from(err: std::io::Error) -> Self {
        WebError::Internal(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
