//! Local-network LLM adapter (Ollama `POST {base_url}/api/generate`).
//!
//! No retry. Every failure carries a hint pointing at the local service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::llm_client::prompts::wrap_local_prompt;
use crate::llm_client::shape::{self, Step};
use crate::llm_client::{
    non_empty, parse_json, read_body, Completion, CompletionError, CompletionProvider,
    ProviderKind, SamplingParams, SamplingPolicy,
};

const PROVIDER: ProviderKind = ProviderKind::Ollama;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const RESPONSE_TEXT: &[Step] = &[Step::Key("response")];

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub sampling: SamplingPolicy,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            sampling: SamplingPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

impl OllamaConfig {
    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn service_hint(&self) -> String {
        format!(
            "Verify the Ollama service is running at {} and that model '{}' is pulled (`ollama pull {}`).",
            self.base_url, self.model, self.model
        )
    }

    async fn generate(
        &self,
        http: &Client,
        prompt: &str,
        sampling: &SamplingParams,
    ) -> Result<String, CompletionError> {
        let wrapped = wrap_local_prompt(prompt);
        let request = GenerateRequest {
            model: &self.model,
            prompt: &wrapped,
            stream: false,
            options: GenerateOptions {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                num_predict: sampling.max_tokens,
            },
        };

        let response = http
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::from_transport(PROVIDER, &e))?;

        let (status, body) = read_body(PROVIDER, response).await?;
        if !status.is_success() {
            return Err(CompletionError::from_status(PROVIDER, status, &body));
        }

        let value = parse_json(PROVIDER, &body)?;
        let text = shape::require_str(&value, RESPONSE_TEXT)
            .map_err(|v| CompletionError::malformed(PROVIDER, v))?;
        non_empty(PROVIDER, text, "response")
    }
}

#[async_trait]
impl CompletionProvider for OllamaConfig {
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
        let text = self
            .generate(http, prompt, sampling)
            .await
            .map_err(|e| e.with_hint(self.service_hint()))?;

        Ok(Completion {
            text,
            provider: PROVIDER,
            model: self.model.clone(),
            fallback_used: false,
        })
    }
}
