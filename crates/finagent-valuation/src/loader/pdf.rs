//! PDF text extraction

use thiserror::Error;

/// Failure reported by a [`PdfExtractor`]
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExtractionError(pub String);

/// Extracts per-page text from PDF bytes
///
/// Implementations run on a blocking thread, so they may be CPU-heavy.
pub trait PdfExtractor: Send + Sync {
    /// Text of each page, in page order
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Extractor for digital PDFs with an embedded text layer, using `pdf-extract`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractionError(e.to_string()))
    }
}
