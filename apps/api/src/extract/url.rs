use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use tracing::{info, warn};

use crate::extract::{ExtractedText, FetchError};

/// Browser-like identifier; many portfolio hosts refuse unknown agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Elements whose text never reaches the output.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Clone)]
pub struct UrlExtractor {
    client: Client,
    char_limit: usize,
}

impl UrlExtractor {
    pub fn new(timeout: Duration, char_limit: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, char_limit })
    }

    pub fn char_limit(&self) -> usize {
        self.char_limit
    }

    /// Fetches `url` and returns its visible text, capped at the extractor limit.
    pub async fn extract_text_from_url(&self, url: &str) -> Result<ExtractedText, FetchError> {
        let url = url.trim();
        if !is_http_url(url) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        info!("Fetching portfolio page: {}", url);

        let response = self.client.get(url).send().await.map_err(|source| {
            if source.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Portfolio fetch returned {}: {}", status, url);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        let text = html_to_text(&html);
        if text.is_empty() {
            return Err(FetchError::Empty("page"));
        }

        let extracted = ExtractedText::bounded(&text, self.char_limit);
        info!(
            "Extracted {} characters from {} (truncated: {})",
            extracted.char_count, url, extracted.truncated
        );
        Ok(extracted)
    }
}

pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Visible text of an HTML document with whitespace collapsed to single spaces.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}
