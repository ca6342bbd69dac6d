use std::time::Duration;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

/// Failures a caller can cause. Synthesis itself never fails on valid input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Storage faults. These are absorbed inside the generation service and
/// never reach an HTTP response.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Error type returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Generation(GenerationError::InvalidRequest(_)) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AppError::Generation(GenerationError::InvalidDimensions { .. }) => (StatusCode::BAD_REQUEST, "INVALID_DIMENSIONS"),
        };
        let body = json!({
            "error": self.to_string(),
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}
