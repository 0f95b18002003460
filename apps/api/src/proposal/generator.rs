//! Proposal generation: validate → assemble background → build prompt →
//! resolve sampling → complete → measure.
//!
//! Validation runs before any outbound call. A request that fails it never
//! reaches a URL fetch or the completion dispatcher.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{ProviderConfig, ProviderKind, ProviderOverrides};
use crate::proposal::background::{assemble_background, BackgroundInput};
use crate::proposal::builder::PromptVariation;
use crate::proposal::metrics::{ProposalAnalysis, ProposalMetrics};
use crate::state::AppState;
use crate::text::truncate_chars;

/// Characters of the job description that seed the export file name.
const EXPORT_NAME_PREFIX_CHARS: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub background: BackgroundInput,
    /// Falls back to `DEFAULT_PROVIDER` when absent.
    pub provider: Option<ProviderKind>,
    #[serde(default)]
    pub overrides: ProviderOverrides,
    /// Makes prompt variation and randomized sampling reproducible.
    pub seed: Option<u64>,
    #[serde(default)]
    pub vary_prompt: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub request_id: Uuid,
    pub provider: ProviderKind,
    pub model: String,
    pub fallback_used: bool,
    pub proposal: String,
    pub metrics: ProposalMetrics,
    pub analysis: ProposalAnalysis,
    pub variation: Option<PromptVariation>,
    pub warnings: Vec<String>,
    pub export_filename: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub background: BackgroundInput,
    pub seed: Option<u64>,
    #[serde(default)]
    pub vary_prompt: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptPreview {
    pub prompt: String,
    pub char_count: usize,
    pub variation: Option<PromptVariation>,
    pub warnings: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Checks everything that can be checked without the network and returns the
/// provider config to dispatch to.
pub fn validate_request(
    config: &Config,
    request: &GenerateRequest,
) -> Result<ProviderConfig, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description is required".to_string()));
    }

    request
        .overrides
        .validate()
        .map_err(AppError::Validation)?;

    let kind = request.provider.unwrap_or(config.default_provider);
    let provider = config.providers.resolve(kind).ok_or_else(|| {
        let var = kind.credential_var().unwrap_or("credentials");
        AppError::Validation(format!("Provider '{kind}' is not configured: set {var}"))
    })?;

    Ok(provider.with_overrides(&request.overrides))
}

pub async fn generate_proposal(
    state: &AppState,
    request: GenerateRequest,
) -> Result<GenerateResponse, AppError> {
    let provider = validate_request(&state.config, &request)?;
    let request_id = Uuid::new_v4();
    info!(
        "Generating proposal {} with {} ({})",
        request_id,
        provider.kind(),
        provider.model()
    );

    let background = assemble_background(&state.extractor, &request.background).await;

    let mut rng = seeded_rng(request.seed);
    let variation = request
        .vary_prompt
        .then(|| PromptVariation::sample(&mut rng));
    let prompt = state.prompt_builder.create_upwork_prompt(
        &request.job_description,
        &background.text,
        variation.as_ref(),
    );
    let sampling = provider.sampling().resolve(&mut rng);

    let completion = state.llm.complete(&provider, &prompt, &sampling).await?;

    let metrics = ProposalMetrics::measure(&completion.text);
    let analysis = ProposalAnalysis::analyze(&completion.text, &request.job_description);
    info!(
        "Proposal {} ready: {} words, {} chars, {:?}",
        request_id, metrics.word_count, metrics.char_count, metrics.limit_status
    );

    Ok(GenerateResponse {
        request_id,
        provider: completion.provider,
        model: completion.model,
        fallback_used: completion.fallback_used,
        proposal: completion.text,
        metrics,
        analysis,
        variation,
        warnings: background.warnings,
        export_filename: export_filename(&request.job_description),
        generated_at: Utc::now(),
    })
}

/// Builds the prompt without dispatching it.
pub async fn preview_prompt(state: &AppState, request: PromptRequest) -> PromptPreview {
    let background = assemble_background(&state.extractor, &request.background).await;
    let mut rng = seeded_rng(request.seed);
    let variation = request
        .vary_prompt
        .then(|| PromptVariation::sample(&mut rng));
    let prompt = state.prompt_builder.create_upwork_prompt(
        &request.job_description,
        &background.text,
        variation.as_ref(),
    );

    PromptPreview {
        char_count: prompt.chars().count(),
        prompt,
        variation,
        warnings: background.warnings,
    }
}

/// `upwork_proposal_<n>.txt`, stable for a given job description.
pub fn export_filename(job_description: &str) -> String {
    let mut hasher = DefaultHasher::new();
    truncate_chars(job_description, EXPORT_NAME_PREFIX_CHARS).hash(&mut hasher);
    format!("upwork_proposal_{}.txt", hasher.finish() % 10_000)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ErrorCause;
    use crate::proposal::metrics::LimitStatus;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::json;

    const JOB: &str = "Need a Python dashboard built with Streamlit, KPI: reduce reporting time by 50% within 2 months";
    const BACKGROUND: &str = "Built 3 Python/SQL dashboards, reduced client reporting time by 60%";

    fn state_with(pairs: &[(&str, &str)]) -> AppState {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_lookup(|key| map.get(key).cloned()).unwrap();
        AppState::new(config).unwrap()
    }

    async fn mock_generate(server: &mut ServerGuard, body: String, hits: usize) -> Mock {
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    fn request(job: &str) -> GenerateRequest {
        GenerateRequest {
            job_description: job.to_string(),
            background: BackgroundInput {
                manual_text: Some(BACKGROUND.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_end_to_end_with_local_provider() {
        let proposal = format!("{}abcde", "abcd ".repeat(839));
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("KPI: reduce reporting time by 50% within 2 months".to_string()),
                Matcher::Regex("reduced client reporting time by 60%".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "response": proposal }).to_string())
            .expect(1)
            .create_async()
            .await;
        let state = state_with(&[("OLLAMA_BASE_URL", server.url().as_str())]);

        let response = generate_proposal(&state, request(JOB)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.provider, ProviderKind::Ollama);
        assert_eq!(response.proposal, proposal);
        assert_eq!(response.metrics.char_count, 4200);
        assert_eq!(response.metrics.word_count, 840);
        assert_eq!(response.metrics.limit_status, LimitStatus::UnderLimit);
        assert!(response.warnings.is_empty());
        assert!(response.export_filename.starts_with("upwork_proposal_"));
        assert!(response.export_filename.ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_empty_job_description_blocks_dispatch() {
        let mut server = Server::new_async().await;
        let mock = mock_generate(&mut server, json!({ "response": "unused" }).to_string(), 0).await;
        let state = state_with(&[("OLLAMA_BASE_URL", server.url().as_str())]);

        let err = generate_proposal(&state, request("   ")).await.unwrap_err();

        match err {
            AppError::Validation(msg) => assert!(msg.contains("job_description")),
            other => panic!("expected validation error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_validation_error() {
        let state = state_with(&[]);
        let mut req = request(JOB);
        req.provider = Some(ProviderKind::Groq);

        let err = generate_proposal(&state, req).await.unwrap_err();

        match err {
            AppError::Validation(msg) => assert!(msg.contains("GROQ_API_KEY")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_overrides_are_rejected_before_dispatch() {
        let state = state_with(&[]);
        let mut req = request(JOB);
        req.overrides.temperature = Some(9.0);

        let err = validate_request(&state.config, &req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let mut server = Server::new_async().await;
        let mock = mock_generate(&mut server, json!({ "done": true }).to_string(), 1).await;
        let state = state_with(&[("OLLAMA_BASE_URL", server.url().as_str())]);

        let err = generate_proposal(&state, request(JOB)).await.unwrap_err();

        match err {
            AppError::Completion(e) => assert_eq!(e.cause, ErrorCause::MalformedResponse),
            other => panic!("expected completion error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_seeded_preview_is_reproducible() {
        let state = state_with(&[]);
        let preview = |seed| PromptRequest {
            job_description: JOB.to_string(),
            seed: Some(seed),
            vary_prompt: true,
            ..Default::default()
        };

        let first = preview_prompt(&state, preview(9)).await;
        let second = preview_prompt(&state, preview(9)).await;

        assert_eq!(first.prompt, second.prompt);
        assert!(first.variation.is_some());
        assert_eq!(first.char_count, first.prompt.chars().count());
        assert!(!first.warnings.is_empty());
    }

    #[test]
    fn test_export_filename_is_stable() {
        let name = export_filename(JOB);
        assert_eq!(name, export_filename(JOB));
        let number: u64 = name
            .trim_start_matches("upwork_proposal_")
            .trim_end_matches(".txt")
            .parse()
            .unwrap();
        assert!(number < 10_000);
    }
}
