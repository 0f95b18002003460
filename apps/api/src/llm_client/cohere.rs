//! Single fixed-vendor adapter (Cohere chat, `POST {base_url}/v1/chat`).
//!
//! The legacy flow: one premium model, a fixed preamble, no provider choice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::llm_client::prompts::PROPOSAL_WRITER_SYSTEM;
use crate::llm_client::sampling::{SamplingParams, DEFAULT_MAX_TOKENS, DEFAULT_TOP_P};
use crate::llm_client::shape::{self, Step};
use crate::llm_client::{
    non_empty, parse_json, read_body, ApiKey, Completion, CompletionError, CompletionProvider,
    ProviderKind, SamplingPolicy,
};

const PROVIDER: ProviderKind = ProviderKind::Cohere;

pub const DEFAULT_BASE_URL: &str = "https://api.cohere.ai";
pub const DEFAULT_MODEL: &str = "command-r-plus";
/// Slightly lower than the other providers for more focused output.
pub const DEFAULT_TEMPERATURE: f32 = 0.6;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const CHAT_TEXT: &[Step] = &[Step::Key("text")];

#[derive(Debug, Clone)]
pub struct CohereConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub sampling: SamplingPolicy,
    pub timeout: Duration,
}

impl CohereConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            sampling: SamplingPolicy::Fixed(SamplingParams {
                temperature: DEFAULT_TEMPERATURE,
                top_p: DEFAULT_TOP_P,
                max_tokens: DEFAULT_MAX_TOKENS,
            }),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    preamble: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[async_trait]
impl CompletionProvider for CohereConfig {
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
        let request = ChatRequest {
            model: &self.model,
            message: prompt,
            preamble: PROPOSAL_WRITER_SYSTEM,
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
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

        let value = parse_json(PROVIDER, &body)?;
        let text = shape::require_str(&value, CHAT_TEXT)
            .map_err(|v| CompletionError::malformed(PROVIDER, v))?;

        Ok(Completion {
            text: non_empty(PROVIDER, text, "text")?,
            provider: PROVIDER,
            model: self.model.clone(),
            fallback_used: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ErrorCause;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config(base_url: &str) -> CohereConfig {
        CohereConfig {
            base_url: base_url.to_string(),
            ..CohereConfig::new(ApiKey::new("co-test"))
        }
    }

    #[tokio::test]
    async fn test_chat_sends_preamble_and_returns_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat")
            .match_header("authorization", "Bearer co-test")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"message": "PROMPT", "max_tokens": 1200})),
                Matcher::Regex(r#""preamble":"[^"]*elite freelance proposal writer"#.to_string()),
                Matcher::Regex(r#""temperature":0\.6"#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"text": " Winning proposal \n", "generation_id": "g-1"}).to_string())
            .expect(1)
            .create_async()
            .await;
        let cfg = config(&server.url());
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(3);
        let sampling = cfg.sampling().resolve(&mut rng);

        let completion = cfg.complete(&Client::new(), "PROMPT", &sampling).await.unwrap();

        assert_eq!(completion.text, "Winning proposal");
        assert_eq!(completion.model, DEFAULT_MODEL);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_key_maps_to_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "invalid api token"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = config(&server.url())
            .complete(&Client::new(), "p", &SamplingParams::default())
            .await
            .unwrap_err();

        assert_eq!(err.cause, ErrorCause::Unauthorized);
        assert!(err.detail.contains("invalid api token"));
        assert!(err.hint.contains("COHERE_API_KEY"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_text_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"generation_id": "g-1"}"#)
            .create_async()
            .await;

        let err = config(&server.url())
            .complete(&Client::new(), "p", &SamplingParams::default())
            .await
            .unwrap_err();

        assert_eq!(err.cause, ErrorCause::MalformedResponse);
        assert!(err.detail.contains("`text` is missing"));
    }
}
