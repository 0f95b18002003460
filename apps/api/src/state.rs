use crate::config::Config;
use crate::extract::UrlExtractor;
use crate::llm_client::LlmClient;
use crate::proposal::builder::PromptBuilder;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    pub extractor: UrlExtractor,
    pub prompt_builder: PromptBuilder,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = LlmClient::new()?;
        let extractor = UrlExtractor::new(config.fetch_timeout, config.extract_char_limit)?;
        let prompt_builder = PromptBuilder::new(config.prompt_fragment_cap);
        Ok(Self {
            config,
            llm,
            extractor,
            prompt_builder,
        })
    }
}
