//! Content extractors: turn a portfolio URL or an uploaded PDF into bounded plain text.
//!
//! Failures are typed (`FetchError`). Callers assembling background text skip a
//! failed source and keep going; the extract endpoints report it as 422.

pub mod handlers;
pub mod pdf;
pub mod url;

use serde::Serialize;
use thiserror::Error;

use crate::text::truncate_chars;

pub use pdf::extract_text_from_pdf;
pub use url::UrlExtractor;

/// Maximum characters returned by any extractor.
pub const DEFAULT_CHAR_LIMIT: usize = 8000;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL must start with http:// or https://: {0}")]
    InvalidUrl(String),

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("No extractable text found in {0}")]
    Empty(&'static str),
}

impl FetchError {
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "INVALID_URL",
            FetchError::Timeout { .. } => "FETCH_TIMEOUT",
            FetchError::Network { .. } => "FETCH_NETWORK",
            FetchError::Status { .. } => "FETCH_STATUS",
            FetchError::Body { .. } => "FETCH_BODY",
            FetchError::Pdf(_) => "PDF_UNREADABLE",
            FetchError::Empty(_) => "NO_TEXT",
        }
    }
}

/// Extracted text, already capped at the extractor limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub char_count: usize,
    /// True when the source held more than the limit.
    pub truncated: bool,
}

impl ExtractedText {
    pub fn bounded(text: &str, limit: usize) -> Self {
        let kept = truncate_chars(text, limit);
        Self {
            text: kept.to_string(),
            char_count: kept.chars().count(),
            truncated: kept.len() < text.len(),
        }
    }
}
