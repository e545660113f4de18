//! Chunking of long documents for the summarize pre-pass
//!
//! Thin wrapper over `text-splitter`: chunks are measured in characters and
//! break at the coarsest semantic boundary that fits (paragraph, line,
//! sentence, word, character).

use crate::document::Document;
use crate::error::{Result, ValuationError};
use text_splitter::{Characters, ChunkConfig};

/// Splits long text into overlapping chunks
pub struct TextSplitter {
    inner: text_splitter::TextSplitter<Characters>,
}

impl TextSplitter {
    /// Create a splitter
    ///
    /// Fails when `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ValuationError::Configuration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| {
                ValuationError::Configuration(format!(
                    "chunk_overlap ({chunk_overlap}) must be less than chunk_size \
                     ({chunk_size}): {e}"
                ))
            })?;

        Ok(Self {
            inner: text_splitter::TextSplitter::new(config),
        })
    }

    /// Split text into chunks of at most `chunk_size` characters
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.inner.chunks(text).map(str::to_string).collect()
    }
}

impl std::fmt::Debug for TextSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextSplitter").finish_non_exhaustive()
    }
}

/// Split documents into chunks, keeping each chunk's source metadata
pub fn split_documents(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Document>> {
    let splitter = TextSplitter::new(chunk_size, chunk_overlap)?;
    Ok(documents
        .iter()
        .flat_map(|doc| {
            splitter
                .split_text(doc.text())
                .into_iter()
                .map(|chunk| doc.with_text(chunk))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::new(100, 10).unwrap();
        assert_eq!(splitter.split_text("Revenue: $10M"), vec!["Revenue: $10M"]);
    }

    #[test]
    fn test_empty_text() {
        let splitter = TextSplitter::new(100, 10).unwrap();
        assert!(splitter.split_text("").is_empty());
    }

    #[test]
    fn test_splits_on_paragraphs_first() {
        let splitter = TextSplitter::new(20, 0).unwrap();
        let chunks = splitter.split_text("First paragraph.\n\nSecond paragraph.");
        assert_eq!(chunks, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn test_chunks_respect_size_and_cover_text() {
        let text = "a b c d e f g h i j";
        let splitter = TextSplitter::new(10, 4).unwrap();
        let chunks = splitter.split_text(text);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 10, "chunk too long: {chunk:?}");
        }
        for word in text.split(' ') {
            assert!(chunks.iter().any(|c| c.contains(word)), "lost {word:?}");
        }
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert!(chunks.iter().all(|c| char_len(c) <= 4));
        assert_eq!(chunks.concat(), "abcdefghij");
    }

    #[test]
    fn test_multibyte_text() {
        let splitter = TextSplitter::new(3, 0).unwrap();
        let chunks = splitter.split_text("估值报告模型");
        assert!(chunks.iter().all(|c| char_len(c) <= 3));
        assert_eq!(chunks.concat(), "估值报告模型");
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(matches!(
            TextSplitter::new(0, 0),
            Err(ValuationError::Configuration(_))
        ));
        assert!(matches!(
            TextSplitter::new(100, 100),
            Err(ValuationError::Configuration(_))
        ));
    }

    #[test]
    fn test_split_documents_keeps_metadata() {
        let docs = vec![Document::page("one two three four", "r.pdf", 1)];
        let chunks = split_documents(&docs, 9, 0).unwrap();

        let texts: Vec<&str> = chunks.iter().map(Document::text).collect();
        assert_eq!(texts, vec!["one two", "three", "four"]);
        assert!(chunks.iter().all(|c| c.page_number() == Some(1)));
        assert!(chunks.iter().all(|c| c.source_path().ends_with("r.pdf")));
    }
}
