//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur while loading or rendering a valuation template
#[derive(Error, Debug)]
pub enum PromptError {
    /// Template source could not be parsed
    #[error("Failed to parse template '{name}': {detail}")]
    TemplateParseFailed { name: String, detail: String },

    /// Template does not reference exactly the `text` variable
    #[error("Template '{name}' must reference exactly one variable `text`, found {found:?}")]
    InvalidPlaceholder { name: String, found: Vec<String> },

    /// Template rendering failed
    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    /// Template file could not be read
    #[error("Failed to load template file '{path}': {detail}")]
    FileLoadError { path: String, detail: String },
}
