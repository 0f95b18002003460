//! Axum route handlers for the Extraction API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::extract::{extract_text_from_pdf, ExtractedText};
use crate::state::AppState;

/// Largest PDF upload accepted by `/api/v1/extract/pdf`.
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ExtractUrlRequest {
    pub url: String,
}

/// POST /api/v1/extract/url
///
/// Fetches a portfolio / profile page and returns its visible text.
pub async fn handle_extract_url(
    State(state): State<AppState>,
    Json(request): Json<ExtractUrlRequest>,
) -> Result<Json<ExtractedText>, AppError> {
    if request.url.trim().is_empty() {
        return Err(AppError::Validation("url cannot be empty".to_string()));
    }
    let extracted = state.extractor.extract_text_from_url(&request.url).await?;
    Ok(Json(extracted))
}

/// POST /api/v1/extract/pdf
///
/// Multipart upload; the PDF must be in the `file` field.
pub async fn handle_extract_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractedText>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?;
        let extracted = extract_text_from_pdf(bytes, state.config.extract_char_limit).await?;
        return Ok(Json(extracted));
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}
