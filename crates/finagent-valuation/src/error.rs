//! Error types for valuation operations

use finagent_llm::LLMError;
use finagent_prompt::PromptError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by document loading and valuation
///
/// None of these are retried; every variant reaches the caller.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Input path does not exist
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input has an extension other than `.txt` or `.pdf`
    #[error("Unsupported document format '{extension}' for {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// File exists but its text could not be extracted
    #[error("Failed to read {}: {detail}", path.display())]
    Read { path: PathBuf, detail: String },

    /// Invalid or incomplete configuration, detected before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote model call failed or timed out
    #[error("Upstream error: {0}")]
    Upstream(LLMError),

    /// Prompt template could not be loaded or rendered
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// `analyze` was called with no documents
    #[error("No documents to analyze")]
    EmptyInput,

    /// Analysis was cancelled before it completed
    #[error("Analysis cancelled")]
    Cancelled,

    /// A background analysis task panicked
    #[error("Analysis task failed: {0}")]
    TaskFailed(String),

    /// Writing results failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for valuation operations
pub type Result<T> = std::result::Result<T, ValuationError>;

impl From<LLMError> for ValuationError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::ConfigurationError(msg) => ValuationError::Configuration(msg),
            other => ValuationError::Upstream(other),
        }
    }
}
