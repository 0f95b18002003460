//! Axum route handlers for the Proposal API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::ProviderKind;
use crate::proposal::generator::{
    generate_proposal, preview_prompt, GenerateRequest, GenerateResponse, PromptPreview,
    PromptRequest,
};
use crate::proposal::insights::{analyze_job, JobInsights};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeJobRequest {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    pub configured: bool,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub default_provider: ProviderKind,
    pub providers: Vec<ProviderStatus>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/proposals/generate
///
/// Runs the full pipeline and returns the proposal with its metrics.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let response = generate_proposal(&state, request).await?;
    Ok(Json(response))
}

/// POST /api/v1/proposals/prompt
///
/// Returns the prompt that generate would send, without calling a provider.
pub async fn handle_preview_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Json<PromptPreview> {
    Json(preview_prompt(&state, request).await)
}

/// POST /api/v1/jobs/analyze
pub async fn handle_analyze_job(
    Json(request): Json<AnalyzeJobRequest>,
) -> Result<Json<JobInsights>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    Ok(Json(analyze_job(&request.job_description)))
}

/// GET /api/v1/providers
///
/// Lists every provider, whether its credentials are present, and its model.
pub async fn handle_list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let providers = ProviderKind::ALL
        .iter()
        .map(|&kind| {
            let resolved = state.config.providers.resolve(kind);
            ProviderStatus {
                provider: kind,
                configured: state.config.providers.is_configured(kind),
                model: resolved.map(|p| p.model().to_string()),
            }
        })
        .collect();

    Json(ProvidersResponse {
        default_provider: state.config.default_provider,
        providers,
    })
}
