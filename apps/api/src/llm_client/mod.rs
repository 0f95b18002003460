/// LLM Client: the single point of entry for all completion calls in the proposal service.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// All LLM interactions MUST go through `LlmClient::complete`.
///
/// Each backend is one variant of `ProviderConfig` carrying its own typed settings.
/// A new provider is added by extending that enum with an adapter module,
/// never by widening a loosely-typed options map.
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::text::truncate_chars;

pub mod cohere;
pub mod groq;
pub mod huggingface;
pub mod ollama;
pub mod prompts;
pub mod sampling;
pub mod shape;

pub use cohere::CohereConfig;
pub use groq::GroqConfig;
pub use huggingface::HuggingFaceConfig;
pub use ollama::OllamaConfig;
pub use sampling::{SamplingParams, SamplingPolicy};

use shape::ShapeViolation;

/// Longest slice of a provider error body carried into `CompletionError::detail`.
const ERROR_BODY_PREVIEW_CHARS: usize = 300;

// ────────────────────────────────────────────────────────────────────────────
// Provider identity
// ────────────────────────────────────────────────────────────────────────────

/// The closed set of completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Locally-run inference service (Ollama `/api/generate`).
    #[serde(rename = "ollama", alias = "local")]
    Ollama,
    /// Hosted fast-inference service with an OpenAI-compatible chat API (Groq).
    #[serde(rename = "groq")]
    Groq,
    /// Hosted open-model inference endpoint (Hugging Face).
    #[serde(rename = "huggingface", alias = "hf", alias = "hugging_face")]
    HuggingFace,
    /// Single fixed premium vendor (Cohere chat), kept for the legacy flow.
    #[serde(rename = "cohere")]
    Cohere,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Ollama,
        ProviderKind::Groq,
        ProviderKind::HuggingFace,
        ProviderKind::Cohere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Groq => "groq",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Cohere => "cohere",
        }
    }

    /// Environment variable that holds this provider's credential, if it needs one.
    pub fn credential_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Ollama => None,
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::HuggingFace => Some("HF_API_KEY"),
            ProviderKind::Cohere => Some("COHERE_API_KEY"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" | "local" => Ok(ProviderKind::Ollama),
            "groq" => Ok(ProviderKind::Groq),
            "huggingface" | "hugging_face" | "hf" => Ok(ProviderKind::HuggingFace),
            "cohere" => Ok(ProviderKind::Cohere),
            other => Err(format!(
                "unknown provider '{other}' (expected ollama, groq, huggingface or cohere)"
            )),
        }
    }
}

/// An API credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Machine-checkable reason a completion call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCause {
    Unauthorized,
    RateLimited,
    BadRequest,
    MalformedResponse,
    Timeout,
    Network,
    Unknown,
}

impl ErrorCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCause::Unauthorized => "unauthorized",
            ErrorCause::RateLimited => "rate_limited",
            ErrorCause::BadRequest => "bad_request",
            ErrorCause::MalformedResponse => "malformed_response",
            ErrorCause::Timeout => "timeout",
            ErrorCause::Network => "network",
            ErrorCause::Unknown => "unknown",
        }
    }

    /// Maps a non-success HTTP status to a cause.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 | 413 | 422 => ErrorCause::BadRequest,
            401 | 403 => ErrorCause::Unauthorized,
            429 => ErrorCause::RateLimited,
            408 | 504 => ErrorCause::Timeout,
            _ => ErrorCause::Unknown,
        }
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one error every adapter returns.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{provider} completion failed ({cause}): {detail}")]
pub struct CompletionError {
    pub provider: ProviderKind,
    pub cause: ErrorCause,
    pub detail: String,
    /// User-facing remediation.
    pub hint: String,
}

impl CompletionError {
    pub fn new(provider: ProviderKind, cause: ErrorCause, detail: impl Into<String>) -> Self {
        Self {
            provider,
            cause,
            detail: detail.into(),
            hint: default_hint(provider, cause),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub(crate) fn from_transport(provider: ProviderKind, err: &reqwest::Error) -> Self {
        let cause = if err.is_timeout() {
            ErrorCause::Timeout
        } else {
            ErrorCause::Network
        };
        Self::new(provider, cause, err.to_string())
    }

    pub(crate) fn from_status(provider: ProviderKind, status: StatusCode, body: &str) -> Self {
        Self::new(
            provider,
            ErrorCause::from_status(status),
            format!("HTTP {}: {}", status.as_u16(), error_message(body)),
        )
    }

    pub(crate) fn malformed(provider: ProviderKind, violation: ShapeViolation) -> Self {
        Self::new(provider, ErrorCause::MalformedResponse, violation.to_string())
    }
}

fn default_hint(provider: ProviderKind, cause: ErrorCause) -> String {
    match cause {
        ErrorCause::Unauthorized => match provider.credential_var() {
            Some(var) => format!("Check the API key configured for {provider} ({var})."),
            None => format!("The {provider} endpoint rejected the request as unauthorized."),
        },
        ErrorCause::RateLimited => format!(
            "The {provider} rate limit or quota was reached. Wait a minute and retry, or switch providers."
        ),
        ErrorCause::BadRequest => {
            "The request was rejected. Shorten the job description or background, or pick another model."
                .to_string()
        }
        ErrorCause::MalformedResponse => format!(
            "The {provider} service returned an unexpected response. Retry, or select a different model."
        ),
        ErrorCause::Timeout => format!(
            "The {provider} service did not answer in time. Retry, or raise LLM_TIMEOUT_SECS."
        ),
        ErrorCause::Network => format!(
            "Could not reach the {provider} service. Check connectivity and the endpoint URL."
        ),
        ErrorCause::Unknown => {
            "Retry the request. If it keeps failing, switch providers.".to_string()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider configuration
// ────────────────────────────────────────────────────────────────────────────

/// A finished completion, normalized to trimmed plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub provider: ProviderKind,
    /// Model that actually produced `text` (differs from the configured one after a fallback).
    pub model: String,
    pub fallback_used: bool,
}

/// Adapter contract shared by every backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    fn sampling(&self) -> &SamplingPolicy;

    async fn complete(
        &self,
        http: &Client,
        prompt: &str,
        sampling: &SamplingParams,
    ) -> Result<Completion, CompletionError>;
}

/// Per-request overrides of a provider's documented defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ProviderOverrides {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err("overrides.model cannot be empty".to_string());
            }
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("overrides.temperature must be within 0.0..=2.0, got {t}"));
            }
        }
        if let Some(p) = self.top_p {
            if !(p > 0.0 && p <= 1.0) {
                return Err(format!("overrides.top_p must be within (0.0, 1.0], got {p}"));
            }
        }
        if self.max_tokens == Some(0) {
            return Err("overrides.max_tokens must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// One configured backend. Dispatch is a `match` over this closed set.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Ollama(OllamaConfig),
    Groq(GroqConfig),
    HuggingFace(HuggingFaceConfig),
    Cohere(CohereConfig),
}

impl ProviderConfig {
    fn adapter(&self) -> &dyn CompletionProvider {
        match self {
            ProviderConfig::Ollama(c) => c,
            ProviderConfig::Groq(c) => c,
            ProviderConfig::HuggingFace(c) => c,
            ProviderConfig::Cohere(c) => c,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.adapter().kind()
    }

    pub fn model(&self) -> &str {
        self.adapter().model()
    }

    pub fn sampling(&self) -> &SamplingPolicy {
        self.adapter().sampling()
    }

    /// Applies request-level overrides. Assumes `overrides.validate()` passed.
    pub fn with_overrides(mut self, overrides: &ProviderOverrides) -> Self {
        let (model, sampling) = match &mut self {
            ProviderConfig::Ollama(c) => (&mut c.model, &mut c.sampling),
            ProviderConfig::Groq(c) => (&mut c.model, &mut c.sampling),
            ProviderConfig::HuggingFace(c) => (&mut c.model, &mut c.sampling),
            ProviderConfig::Cohere(c) => (&mut c.model, &mut c.sampling),
        };
        if let Some(m) = &overrides.model {
            *model = m.trim().to_string();
        }
        sampling.apply_overrides(overrides);
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ────────────────────────────────────────────────────────────────────────────

/// The single completion dispatcher used by the proposal pipeline.
/// Stateless between calls; every call carries its own provider config.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
}

impl LlmClient {
    pub fn new() -> anyhow::Result<Self> {
        // Timeouts are applied per request from each provider's config.
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Sends `prompt` to the selected provider and returns its trimmed text.
    pub async fn complete(
        &self,
        provider: &ProviderConfig,
        prompt: &str,
        sampling: &SamplingParams,
    ) -> Result<Completion, CompletionError> {
        let adapter = provider.adapter();
        info!(
            provider = %adapter.kind(),
            model = adapter.model(),
            prompt_chars = prompt.chars().count(),
            temperature = sampling.temperature,
            top_p = sampling.top_p,
            max_tokens = sampling.max_tokens,
            "Dispatching completion"
        );

        match adapter.complete(&self.client, prompt, sampling).await {
            Ok(completion) => {
                debug!(
                    "Completion succeeded: provider={}, model={}, chars={}, fallback={}",
                    completion.provider,
                    completion.model,
                    completion.text.chars().count(),
                    completion.fallback_used
                );
                Ok(completion)
            }
            Err(err) => {
                warn!(
                    provider = %err.provider,
                    cause = %err.cause,
                    "Completion failed: {}",
                    err.detail
                );
                Err(err)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers shared by the adapters
// ────────────────────────────────────────────────────────────────────────────

/// Reads status and body; a body read failure is a transport failure.
pub(crate) async fn read_body(
    provider: ProviderKind,
    response: Response,
) -> Result<(StatusCode, String), CompletionError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CompletionError::from_transport(provider, &e))?;
    Ok((status, body))
}

pub(crate) fn parse_json(provider: ProviderKind, body: &str) -> Result<Value, CompletionError> {
    serde_json::from_str(body).map_err(|e| {
        CompletionError::new(
            provider,
            ErrorCause::MalformedResponse,
            format!("response body is not valid JSON: {e}"),
        )
    })
}

/// `{"error": {"message": ...}}` or `{"error": "..."}`.
pub(crate) fn api_error_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(String::from)
}

/// Best human-readable message from an error body.
pub(crate) fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let structured = parsed.as_ref().and_then(|v| {
        api_error_message(v).or_else(|| v.get("message").and_then(Value::as_str).map(String::from))
    });
    if let Some(message) = structured {
        return message;
    }
    let raw = body.trim();
    if raw.is_empty() {
        "empty response body".to_string()
    } else {
        truncate_chars(raw, ERROR_BODY_PREVIEW_CHARS).to_string()
    }
}

/// Trims `text`; blank output is a malformed response, never a silent success.
pub(crate) fn non_empty(
    provider: ProviderKind,
    text: &str,
    field: &str,
) -> Result<String, CompletionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CompletionError::new(
            provider,
            ErrorCause::MalformedResponse,
            format!("{field}: is empty"),
        ));
    }
    Ok(trimmed.to_string())
}
