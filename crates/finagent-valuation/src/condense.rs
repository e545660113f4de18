//! Condensing pre-pass for long or multi-part inputs
//!
//! Large filings do not fit a single prompt. When the input is split over
//! several documents or exceeds the character threshold, the text is either
//! truncated or summarised map-reduce style before valuation.

use crate::document::{Document, concat_text};
use crate::error::{Result, ValuationError};
use crate::pipeline::ValuationPipeline;
use crate::splitter::TextSplitter;
use finagent_llm::ResponseFormat;
use finagent_prompt::ValuationTemplate;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

const MAP_PROMPT: &str =
    "Write a concise summary of the following:\n\n\n\"{{ text }}\"\n\n\nCONCISE SUMMARY:";
const COMBINE_PROMPT: &str = "Write a concise summary of the following financial notes. \
Keep every figure, ratio, growth rate, company name and ticker exactly as written:\n\n\n\
\"{{ text }}\"\n\n\nCONCISE SUMMARY:";

/// Concurrent map calls per analysis
const MAP_CONCURRENCY: usize = 4;

/// How to shrink input that is too large for one prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CondenseStrategy {
    /// Send the concatenated text as-is
    Off,
    /// Keep the first `threshold_chars` characters
    Truncate,
    /// Summarise chunks, then summarise the summaries
    #[default]
    Summarize,
}

impl fmt::Display for CondenseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CondenseStrategy::Off => "off",
            CondenseStrategy::Truncate => "truncate",
            CondenseStrategy::Summarize => "summarize",
        })
    }
}

impl FromStr for CondenseStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(CondenseStrategy::Off),
            "truncate" => Ok(CondenseStrategy::Truncate),
            "summarize" | "summarise" => Ok(CondenseStrategy::Summarize),
            other => Err(format!("unknown condense strategy '{other}'")),
        }
    }
}

/// Condensing pre-pass settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondenseConfig {
    pub strategy: CondenseStrategy,

    /// Combined length (characters) above which the pre-pass runs
    pub threshold_chars: usize,

    /// Chunk size (characters) for summarisation
    pub chunk_size: usize,

    /// Overlap (characters) between adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for CondenseConfig {
    fn default() -> Self {
        Self {
            strategy: CondenseStrategy::Summarize,
            threshold_chars: 8000,
            chunk_size: 4000,
            chunk_overlap: 200,
        }
    }
}

impl CondenseConfig {
    /// Pre-pass disabled
    pub fn off() -> Self {
        Self {
            strategy: CondenseStrategy::Off,
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: CondenseStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_threshold(mut self, threshold_chars: usize) -> Self {
        self.threshold_chars = threshold_chars;
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Validate sizes
    pub fn validate(&self) -> Result<()> {
        if self.strategy == CondenseStrategy::Off {
            return Ok(());
        }
        if self.threshold_chars == 0 {
            return Err(ValuationError::Configuration(
                "condense threshold must be greater than 0".to_string(),
            ));
        }
        TextSplitter::new(self.chunk_size, self.chunk_overlap).map(|_| ())
    }

    /// Whether the pre-pass runs for these documents
    ///
    /// True for more than one document or combined text over the threshold,
    /// unless the strategy is `Off`.
    pub fn applies(&self, documents: &[Document]) -> bool {
        if self.strategy == CondenseStrategy::Off {
            return false;
        }
        documents.len() > 1
            || documents.iter().map(Document::char_len).sum::<usize>() > self.threshold_chars
    }
}

/// Keep at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Produce the text that goes into the valuation prompt
pub(crate) async fn prepare_text(
    pipeline: &ValuationPipeline,
    documents: &[Document],
) -> Result<String> {
    let config = &pipeline.config().condense;

    if !config.applies(documents) {
        return Ok(concat_text(documents));
    }

    match config.strategy {
        CondenseStrategy::Off => Ok(concat_text(documents)),
        CondenseStrategy::Truncate => {
            let text = concat_text(documents);
            let truncated = truncate_chars(&text, config.threshold_chars);
            if truncated.len() < text.len() {
                info!(
                    from = text.chars().count(),
                    to = config.threshold_chars,
                    "Truncated input text"
                );
            }
            Ok(truncated.to_string())
        }
        CondenseStrategy::Summarize => summarize(pipeline, documents, config).await,
    }
}

async fn summarize(
    pipeline: &ValuationPipeline,
    documents: &[Document],
    config: &CondenseConfig,
) -> Result<String> {
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
    let chunks: Vec<String> = documents
        .iter()
        .flat_map(|doc| splitter.split_text(doc.text()))
        .collect();

    if chunks.is_empty() {
        return Ok(String::new());
    }

    info!(
        documents = documents.len(),
        chunks = chunks.len(),
        "Summarizing input before valuation"
    );

    let map_prompt = ValuationTemplate::new("summary_map", MAP_PROMPT)?;
    let combine_prompt = ValuationTemplate::new("summary_combine", COMBINE_PROMPT)?;

    let prompts = chunks
        .iter()
        .map(|chunk| map_prompt.render(chunk))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // Map: one call per chunk, results kept in chunk order
    let summaries: Vec<String> = stream::iter(prompts)
        .map(|prompt| pipeline.complete_text(prompt, ResponseFormat::Text))
        .buffered(MAP_CONCURRENCY)
        .try_collect()
        .await?;

    debug!(partials = summaries.len(), "Map step complete");

    // Reduce: one call over the joined partial summaries
    let combined = combine_prompt.render(&summaries.join("\n"))?;
    pipeline.complete_text(combined, ResponseFormat::Text).await
}
