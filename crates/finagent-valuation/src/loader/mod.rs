//! Document loading
//!
//! Turns a file path into [`Document`]s: one per `.txt` file, one per page for
//! `.pdf`. Nothing but file reads happens here.

mod pdf;
mod text;

pub use pdf::{ExtractionError, PdfExtractor, PdfTextExtractor};
pub use text::decode_text;

use crate::document::{Document, DocumentFormat};
use crate::error::{Result, ValuationError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Loads `.txt` and `.pdf` files into documents
#[derive(Clone)]
pub struct DocumentLoader {
    pdf: Arc<dyn PdfExtractor>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentLoader").finish_non_exhaustive()
    }
}

impl DocumentLoader {
    /// Loader with the default `pdf-extract` backend
    pub fn new() -> Self {
        Self::with_pdf_extractor(Arc::new(PdfTextExtractor))
    }

    /// Loader with a custom PDF backend
    pub fn with_pdf_extractor(pdf: Arc<dyn PdfExtractor>) -> Self {
        Self { pdf }
    }

    /// Load a file into documents
    ///
    /// # Returns
    ///
    /// * `.txt` - exactly one document holding the whole file
    /// * `.pdf` - one document per page, indexed from 0
    ///
    /// Errors are checked in order: missing path (`NotFound`), unknown
    /// extension (`UnsupportedFormat`), then read/extraction failures (`Read`).
    /// A readable supported file never yields zero documents.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Vec<Document>> {
        let path = path.as_ref();

        match tokio::fs::metadata(path).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ValuationError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(read_error(path, e)),
        }

        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            ValuationError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            }
        })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| read_error(path, e))?;
        debug!(bytes = bytes.len(), ?format, "Read document");

        let documents = match format {
            DocumentFormat::Text => vec![Document::new(decode_text(bytes), path)],
            DocumentFormat::Pdf => self.load_pdf(path, bytes).await?,
        };

        info!(documents = documents.len(), "Loaded document");
        Ok(documents)
    }

    async fn load_pdf(&self, path: &Path, bytes: Vec<u8>) -> Result<Vec<Document>> {
        let extractor = Arc::clone(&self.pdf);
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes))
            .await
            .map_err(|e| read_error(path, format!("PDF extraction aborted: {e}")))?
            .map_err(|e| read_error(path, e))?;

        if pages.is_empty() {
            return Err(read_error(path, "PDF contains no pages"));
        }

        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| Document::page(text, path, i))
            .collect())
    }
}

fn read_error(path: &Path, detail: impl ToString) -> ValuationError {
    ValuationError::Read {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}
