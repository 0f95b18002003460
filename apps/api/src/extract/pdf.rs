use bytes::Bytes;
use tracing::{info, warn};

use crate::extract::{ExtractedText, FetchError};

/// Extracts the text of every page of an uploaded PDF, capped at `char_limit`.
///
/// Parsing runs on the blocking pool; a parser panic on a corrupt file is
/// reported as `FetchError::Pdf` like any other parse failure.
pub async fn extract_text_from_pdf(
    bytes: Bytes,
    char_limit: usize,
) -> Result<ExtractedText, FetchError> {
    if bytes.is_empty() {
        return Err(FetchError::Pdf("uploaded file is empty".to_string()));
    }

    let size = bytes.len();
    let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| FetchError::Pdf(format!("parser aborted: {e}")))?
        .map_err(|e| {
            warn!("PDF parse failed ({} bytes): {:?}", size, e);
            FetchError::Pdf(format!("{e:?}"))
        })?;

    let text = join_page_lines(&raw);
    if text.is_empty() {
        return Err(FetchError::Empty("PDF"));
    }

    let extracted = ExtractedText::bounded(&text, char_limit);
    info!(
        "Extracted {} characters from PDF ({} bytes, truncated: {})",
        extracted.char_count, size, extracted.truncated
    );
    Ok(extracted)
}

/// Drops blank lines and trailing spaces the page layout leaves behind.
fn join_page_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DEFAULT_CHAR_LIMIT;

    const PORTFOLIO_PDF: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/portfolio.pdf"));

    #[test]
    fn test_join_page_lines_drops_blank_lines() {
        let raw = "\n\nPage one line  \n\n\n  second line\n\u{c}\nPage two\n";
        assert_eq!(join_page_lines(raw), "Page one line\nsecond line\nPage two");
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let err = extract_text_from_pdf(Bytes::new(), DEFAULT_CHAR_LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Pdf(_)));
        assert_eq!(err.code(), "PDF_UNREADABLE");
    }

    #[tokio::test]
    async fn test_corrupt_upload_is_pdf_error() {
        let bytes = Bytes::from_static(b"this is definitely not a pdf document");
        let err = extract_text_from_pdf(bytes, DEFAULT_CHAR_LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Pdf(_)));
    }

    #[tokio::test]
    async fn test_extracts_page_text() {
        let extracted = extract_text_from_pdf(Bytes::from_static(PORTFOLIO_PDF), DEFAULT_CHAR_LIMIT)
            .await
            .unwrap();

        assert!(extracted.text.contains("Built 3 dashboards reduced time by 60%"));
        assert_eq!(extracted.char_count, extracted.text.chars().count());
        assert!(!extracted.truncated);
    }

    #[tokio::test]
    async fn test_extracted_text_is_capped() {
        let extracted = extract_text_from_pdf(Bytes::from_static(PORTFOLIO_PDF), 10)
            .await
            .unwrap();

        assert_eq!(extracted.text, "Built 3 da");
        assert_eq!(extracted.char_count, 10);
        assert!(extracted.truncated);
    }
}
