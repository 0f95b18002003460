pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extract::handlers::{self as extract, MAX_PDF_BYTES};
use crate::proposal::handlers as proposal;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/providers", get(proposal::handle_list_providers))
        // Extraction API
        .route("/api/v1/extract/url", post(extract::handle_extract_url))
        .route(
            "/api/v1/extract/pdf",
            post(extract::handle_extract_pdf).layer(DefaultBodyLimit::max(MAX_PDF_BYTES)),
        )
        // Proposal API
        .route("/api/v1/jobs/analyze", post(proposal::handle_analyze_job))
        .route(
            "/api/v1/proposals/prompt",
            post(proposal::handle_preview_prompt),
        )
        .route(
            "/api/v1/proposals/generate",
            post(proposal::handle_generate),
        )
        .with_state(state)
}
