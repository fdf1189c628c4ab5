//! Error types for the ConvertIO server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use convertio_core::ConvertError;
use serde::Serialize;
use thiserror::Error;

/// Message returned for every failure inside the PDF library
pub const OPERATION_FAILED: &str = "Operation failed";

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Operation timeout after {0}ms")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

impl ServerError {
    fn status_code_and_message(&self) -> (StatusCode, &'static str, String) {
        match self {
            ServerError::Convert(err) if err.is_client_error() => {
                let code = match err {
                    ConvertError::NoFiles | ConvertError::EmptyFile(_) => "NO_FILES",
                    ConvertError::TooManyFiles | ConvertError::WrongFileType(_) => "INVALID_UPLOAD",
                    ConvertError::UnsupportedTool(_) => "UNSUPPORTED_TOOL",
                    ConvertError::InvalidRange(_) => "INVALID_PAGE_RANGE",
                    ConvertError::InvalidRotation(_) => "INVALID_ROTATION",
                    ConvertError::MissingPassword => "PASSWORD_REQUIRED",
                    _ => "INVALID_REQUEST",
                };
                (StatusCode::BAD_REQUEST, code, client_message(err))
            }
            ServerError::Convert(err) => {
                tracing::error!("Conversion error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "OPERATION_FAILED",
                    OPERATION_FAILED.to_string(),
                )
            }
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ServerError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            ServerError::Timeout(ms) => (
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
                format!("Operation timeout after {}ms", ms),
            ),
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    OPERATION_FAILED.to_string(),
                )
            }
        }
    }
}

/// The user-facing wording for validation failures
fn client_message(err: &ConvertError) -> String {
    match err {
        ConvertError::UnsupportedTool(_) => "Tool not supported".to_string(),
        ConvertError::InvalidRange(_) => "Invalid page numbers".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.status_code_and_message();

        let body = ErrorResponse {
            success: false,
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(err.body_text())
        } else {
            ServerError::InvalidRequest(format!("Malformed upload: {}", err.body_text()))
        }
    }
}
