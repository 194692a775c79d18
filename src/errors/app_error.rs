//! Crate-level error type returned by HTTP handlers.
//!
//! Client-visible messages are deliberately generic: collaborator failures
//! (ffmpeg, the inference backend) carry internals that must stay in the
//! server logs. `IntoResponse` logs the full error and maps it to the
//! standard JSON error envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::core::inference::InferenceError;
use crate::core::media::EncodingError;

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Client sent a structurally invalid request (bad field, missing file).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Media encoding collaborator failed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Inference collaborator failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Multipart form could not be read.
    #[error("multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Standard error response envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl ErrorBody {
    fn new(message: impl Into<String>, error_code: &'static str) -> Self {
        Self {
            status: "error",
            message: message.into(),
            error_code: Some(error_code),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(msg.clone(), "invalid_request"),
            ),
            AppError::Encoding(EncodingError::UnsupportedFormat { kind, extension }) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(
                    format!("Unsupported {kind} format: {extension}"),
                    "unsupported_format",
                ),
            ),
            AppError::Encoding(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new(
                    "Unable to process media file. Please check the file format and try again.",
                    "processing_failed",
                ),
            ),
            AppError::Inference(InferenceError::NoInput) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("At least one input must be provided", "no_input"),
            ),
            AppError::Inference(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new(
                    "Unable to process your request. Please try again.",
                    "processing_failed",
                ),
            ),
            AppError::Multipart(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid upload. Please try again.", "invalid_upload"),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::MediaKind;

    #[tokio::test]
    async fn encoding_failure_maps_to_generic_500() {
        let err = AppError::Encoding(EncodingError::ToolFailed {
            kind: MediaKind::Audio,
            detail: "ffmpeg: unsupported codec mp9".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        // internal detail never leaks to the client
        assert!(!text.contains("mp9"));
        assert!(text.contains("processing_failed"));
    }

    #[tokio::test]
    async fn unsupported_format_is_a_client_error() {
        let err = AppError::Encoding(EncodingError::UnsupportedFormat {
            kind: MediaKind::Image,
            extension: ".tiff".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn no_input_is_a_client_error() {
        let err = AppError::Inference(InferenceError::NoInput);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
