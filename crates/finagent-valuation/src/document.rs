//! Extracted document text with its source metadata

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Input formats the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Plain text, loaded as a single document
    Text,
    /// PDF, loaded as one document per page
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(DocumentFormat::Text),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }
}

/// A unit of extracted text
///
/// Documents are immutable once created. PDF pages carry their 0-based page
/// index; text files have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    text: String,
    source_path: PathBuf,
    page_number: Option<usize>,
}

impl Document {
    /// Create a document for a whole file
    pub fn new(text: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            source_path: source_path.into(),
            page_number: None,
        }
    }

    /// Create a document for a single page
    pub fn page(
        text: impl Into<String>,
        source_path: impl Into<PathBuf>,
        page_number: usize,
    ) -> Self {
        Self {
            text: text.into(),
            source_path: source_path.into(),
            page_number: Some(page_number),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn page_number(&self) -> Option<usize> {
        self.page_number
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Same metadata, different text
    pub(crate) fn with_text(&self, text: String) -> Self {
        Self {
            text,
            source_path: self.source_path.clone(),
            page_number: self.page_number,
        }
    }
}

/// Join document texts in order, separated by a blank line
pub fn concat_text(documents: &[Document]) -> String {
    documents
        .iter()
        .map(Document::text)
        .collect::<Vec<_>>()
        .join("\n\n")
}
