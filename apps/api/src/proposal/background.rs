use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extract::{ExtractedText, UrlExtractor};

pub const MISSING_BACKGROUND_WARNING: &str = "Technical background recommended for better results";

/// Background sources supplied with a request. All optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackgroundInput {
    #[serde(default)]
    pub portfolio_url: Option<String>,
    /// Text of an uploaded resume, usually obtained from `/api/v1/extract/pdf`.
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub manual_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssembledBackground {
    pub text: String,
    pub warnings: Vec<String>,
}

/// Joins portfolio, resume and manual text with blank lines.
/// A source that fails to extract is skipped with a warning; it never fails the request.
pub async fn assemble_background(
    extractor: &UrlExtractor,
    input: &BackgroundInput,
) -> AssembledBackground {
    let mut parts: Vec<String> = Vec::new();
    let mut warnings = Vec::new();

    if let Some(url) = non_blank(input.portfolio_url.as_deref()) {
        match extractor.extract_text_from_url(url).await {
            Ok(extracted) => parts.push(extracted.text),
            Err(e) => {
                warn!("Skipping portfolio URL: {e}");
                warnings.push(format!("Portfolio URL skipped: {e}"));
            }
        }
    }

    let limit = extractor.char_limit();
    for text in [input.resume_text.as_deref(), input.manual_text.as_deref()] {
        if let Some(text) = non_blank(text) {
            parts.push(ExtractedText::bounded(text, limit).text);
        }
    }

    if parts.is_empty() {
        warnings.push(MISSING_BACKGROUND_WARNING.to_string());
    }

    AssembledBackground {
        text: parts.join("\n\n"),
        warnings,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::url::DEFAULT_FETCH_TIMEOUT;
    use mockito::Server;

    fn extractor(limit: usize) -> UrlExtractor {
        UrlExtractor::new(DEFAULT_FETCH_TIMEOUT, limit).unwrap()
    }

    #[tokio::test]
    async fn test_joins_sources_in_order() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>Portfolio text</p>")
            .expect(1)
            .create_async()
            .await;
        let input = BackgroundInput {
            portfolio_url: Some(server.url()),
            resume_text: Some("Resume text".into()),
            manual_text: Some("  Manual text ".into()),
        };

        let assembled = assemble_background(&extractor(8000), &input).await;

        assert_eq!(assembled.text, "Portfolio text\n\nResume text\n\nManual text");
        assert!(assembled.warnings.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_url_becomes_warning() {
        let input = BackgroundInput {
            portfolio_url: Some("not-a-url".into()),
            manual_text: Some("Built 3 dashboards".into()),
            ..Default::default()
        };

        let assembled = assemble_background(&extractor(8000), &input).await;

        assert_eq!(assembled.text, "Built 3 dashboards");
        assert_eq!(assembled.warnings.len(), 1);
        assert!(assembled.warnings[0].starts_with("Portfolio URL skipped"));
    }

    #[tokio::test]
    async fn test_empty_background_warns_without_failing() {
        let assembled = assemble_background(&extractor(8000), &BackgroundInput::default()).await;
        assert!(assembled.text.is_empty());
        assert_eq!(assembled.warnings, vec![MISSING_BACKGROUND_WARNING.to_string()]);
    }

    #[tokio::test]
    async fn test_each_source_is_capped() {
        let input = BackgroundInput {
            resume_text: Some("r".repeat(50)),
            manual_text: Some("m".repeat(50)),
            ..Default::default()
        };

        let assembled = assemble_background(&extractor(10), &input).await;

        assert_eq!(assembled.text, format!("{}\n\n{}", "r".repeat(10), "m".repeat(10)));
    }
}
