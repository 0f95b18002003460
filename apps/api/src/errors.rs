use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::FetchError;
use crate::llm_client::CompletionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] FetchError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "code": "VALIDATION_ERROR", "message": msg }),
            ),
            AppError::Extraction(e) => {
                tracing::warn!("Extraction failed: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "code": e.code(), "message": e.to_string() }),
                )
            }
            AppError::Completion(e) => {
                tracing::error!("Completion failed: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "code": "COMPLETION_FAILED",
                        "message": e.to_string(),
                        "provider": e.provider,
                        "cause": e.cause,
                        "hint": e.hint,
                    }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "code": "INTERNAL_ERROR",
                        "message": "An internal server error occurred",
                    }),
                )
            }
        };

        (status, Json(json!({ "error": body }))).into_response()
    }
}
