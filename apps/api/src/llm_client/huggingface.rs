//! Hosted open-model inference adapter (Hugging Face `POST {base_url}/{model}`).
//!
//! A 503 means the model is still loading: wait `loading_retry_delay`, retry
//! exactly once, and treat the second response as final.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::warn;

use crate::llm_client::prompts::wrap_inference_prompt;
use crate::llm_client::shape::{self, Step};
use crate::llm_client::{
    api_error_message, non_empty, parse_json, read_body, ApiKey, Completion, CompletionError,
    CompletionProvider, ErrorCause, ProviderKind, SamplingParams, SamplingPolicy,
};

const PROVIDER: ProviderKind = ProviderKind::HuggingFace;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";
pub const DEFAULT_LOADING_RETRY_DELAY: Duration = Duration::from_secs(20);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const SEQUENCE_TEXT: &[Step] = &[Step::Index(0), Step::Key("generated_text")];
const OBJECT_TEXT: &[Step] = &[Step::Key("generated_text")];

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub sampling: SamplingPolicy,
    pub loading_retry_delay: Duration,
    pub timeout: Duration,
}

impl HuggingFaceConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            sampling: SamplingPolicy::default(),
            loading_retry_delay: DEFAULT_LOADING_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.model)
    }

    async fn send(
        &self,
        http: &Client,
        request: &InferenceRequest<'_>,
    ) -> Result<(StatusCode, String), CompletionError> {
        let response = http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| CompletionError::from_transport(PROVIDER, &e))?;
        read_body(PROVIDER, response).await
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    temperature: f32,
    do_sample: bool,
    top_p: f32,
}

/// Accepts `[{"generated_text": ...}]` or `{"generated_text": ...}` and strips an echoed prompt.
fn normalize_generated_text(body: &str, inputs: &str) -> Result<String, CompletionError> {
    let value = parse_json(PROVIDER, body)?;
    if let Some(message) = api_error_message(&value) {
        return Err(CompletionError::new(PROVIDER, ErrorCause::Unknown, message));
    }
    let path = if value.is_array() {
        SEQUENCE_TEXT
    } else {
        OBJECT_TEXT
    };
    let generated =
        shape::require_str(&value, path).map_err(|v| CompletionError::malformed(PROVIDER, v))?;
    let answer = generated.strip_prefix(inputs).unwrap_or(generated);
    non_empty(PROVIDER, answer, "generated_text")
}

#[async_trait]
impl CompletionProvider for HuggingFaceConfig {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn sampling(&self) -> &SamplingPolicy {
        &self.sampling
    }

    async fn complete(
        &self,
        http: &Client,
        prompt: &str,
        sampling: &SamplingParams,
    ) -> Result<Completion, CompletionError> {
        let inputs = wrap_inference_prompt(prompt);
        let request = InferenceRequest {
            inputs: &inputs,
            parameters: InferenceParameters {
                max_length: sampling.max_tokens,
                temperature: sampling.temperature,
                do_sample: true,
                top_p: sampling.top_p,
            },
        };

        let (mut status, mut body) = self.send(http, &request).await?;
        if status == StatusCode::SERVICE_UNAVAILABLE {
            warn!(
                "Model {} is loading, retrying once in {}s",
                self.model,
                self.loading_retry_delay.as_secs_f32()
            );
            tokio::time::sleep(self.loading_retry_delay).await;
            (status, body) = self.send(http, &request).await?;
        }

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(CompletionError::new(
                PROVIDER,
                ErrorCause::Unknown,
                format!("model '{}' is still loading", self.model),
            )
            .with_hint(
                "The model is still warming up. Try again in a minute, or choose a smaller model.",
            ));
        }
        if !status.is_success() {
            return Err(CompletionError::from_status(PROVIDER, status, &body));
        }

        let text = normalize_generated_text(&body, &inputs)?;
        Ok(Completion {
            text,
            provider: PROVIDER,
            model: self.model.clone(),
            fallback_used: false,
        })
    }
}
