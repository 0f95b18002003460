//! Hosted fast-inference adapter (Groq, OpenAI-compatible `POST {base_url}/chat/completions`).
//!
//! On HTTP 400 the request is retried exactly once against the fallback model
//! with a reduced token budget. 401 and 429 are surfaced immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use crate::llm_client::prompts::PROPOSAL_WRITER_SYSTEM;
use crate::llm_client::shape::{self, Step};
use crate::llm_client::{
    api_error_message, non_empty, parse_json, read_body, ApiKey, Completion, CompletionError,
    CompletionProvider, ErrorCause, ProviderKind, SamplingParams, SamplingPolicy,
};

const PROVIDER: ProviderKind = ProviderKind::Groq;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_FALLBACK_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_FALLBACK_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const CHAT_CONTENT: &[Step] = &[
    Step::Key("choices"),
    Step::Index(0),
    Step::Key("message"),
    Step::Key("content"),
];

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    /// Smaller model tried once when the primary rejects the request.
    pub fallback_model: String,
    pub fallback_max_tokens: u32,
    pub sampling: SamplingPolicy,
    pub timeout: Duration,
}

impl GroqConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            fallback_max_tokens: DEFAULT_FALLBACK_MAX_TOKENS,
            sampling: SamplingPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn chat(
        &self,
        http: &Client,
        prompt: &str,
        model: &str,
        sampling: &SamplingParams,
    ) -> Result<String, CompletionError> {
        let request = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: PROPOSAL_WRITER_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            model,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            top_p: sampling.top_p,
            stream: false,
        };

        let response = http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::from_transport(PROVIDER, &e))?;

        let (status, body) = read_body(PROVIDER, response).await?;
        if !status.is_success() {
            return Err(CompletionError::from_status(PROVIDER, status, &body));
        }
        parse_chat_content(&body)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Validates `choices[0].message.content` and returns it trimmed.
fn parse_chat_content(body: &str) -> Result<String, CompletionError> {
    let value = parse_json(PROVIDER, body)?;
    if let Some(message) = api_error_message(&value) {
        return Err(CompletionError::new(PROVIDER, ErrorCause::Unknown, message));
    }
    let content = shape::require_str(&value, CHAT_CONTENT)
        .map_err(|v| CompletionError::malformed(PROVIDER, v))?;
    non_empty(PROVIDER, content, "choices[0].message.content")
}

#[async_trait]
impl CompletionProvider for GroqConfig {
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
        match self.chat(http, prompt, &self.model, sampling).await {
            Ok(text) => Ok(Completion {
                text,
                provider: PROVIDER,
                model: self.model.clone(),
                fallback_used: false,
            }),
            Err(err) if err.cause == ErrorCause::BadRequest => {
                warn!(
                    "Groq rejected model {} ({}), retrying once with {}",
                    self.model, err.detail, self.fallback_model
                );
                let reduced = SamplingParams {
                    max_tokens: sampling.max_tokens.min(self.fallback_max_tokens),
                    ..*sampling
                };
                let text = self
                    .chat(http, prompt, &self.fallback_model, &reduced)
                    .await?;
                Ok(Completion {
                    text,
                    provider: PROVIDER,
                    model: self.fallback_model.clone(),
                    fallback_used: true,
                })
            }
            Err(err) => Err(err),
        }
    }
}
