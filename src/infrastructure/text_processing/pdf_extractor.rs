use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{ExtractionError, TextExtractor};

use super::text_sanitizer::join_pages;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Extracts the text layer of a PDF with `pdf-extract`. Scanned documents
/// without a text layer yield `NoTextFound`.
pub struct PdfTextExtractor {
    timeout: Duration,
}

impl PdfTextExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl PdfTextExtractor {
    /// Raw text of every page, in order.
    pub async fn extract_pages(&self, data: &[u8], file_name: &str) -> Result<Vec<String>, ExtractionError> {
        if !data.starts_with(PDF_MAGIC) {
            return Err(ExtractionError::Unsupported(format!(
                "{file_name} is not a PDF document"
            )));
        }

        let owned = data.to_vec();
        tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&owned)),
        )
        .await
        .map_err(|_| ExtractionError::ExtractionFailed("PDF extraction timed out".to_string()))?
        .map_err(|e| ExtractionError::ExtractionFailed(format!("PDF parser crashed: {e}")))?
        .map_err(|e| ExtractionError::ExtractionFailed(format!("failed to parse PDF: {e}")))
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn extract(&self, data: &[u8], file_name: &str) -> Result<String, ExtractionError> {
        let pages = self.extract_pages(data, file_name).await?;
        let text = join_pages(pages.iter().map(String::as_str));
        tracing::info!(page_count = pages.len(), chars = text.len(), "PDF text extraction complete");

        if text.is_empty() {
            return Err(ExtractionError::NoTextFound(file_name.to_string()));
        }

        Ok(text)
    }
}
