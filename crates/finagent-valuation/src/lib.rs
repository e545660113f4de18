//! Financial document valuation
//!
//! Loads a `.txt` or `.pdf` filing, renders a valuation prompt and asks an
//! OpenAI-compatible model for either a structured valuation (JSON fields
//! such as market cap, P/E and fair value) or a free-form report.
//!
//! # Example
//!
//! ```no_run
//! use finagent_valuation::{ResultWriter, ValuationConfig, ValuationPipeline};
//! use std::path::Path;
//!
//! # async fn run() -> finagent_valuation::Result<()> {
//! let config = ValuationConfig::builder().with_env_api_key().build()?;
//! let pipeline = ValuationPipeline::new(config)?;
//!
//! let input = Path::new("filings/acme_10k.pdf");
//! let result = pipeline.analyze_file(input).await?;
//!
//! if let Some(valuation) = result.as_structured() {
//!     println!("Fair value: {}", valuation.report().estimated_fair_value);
//! }
//! ResultWriter::default().write(input, &result, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod condense;
pub mod config;
pub mod document;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod result;
pub mod sampling;
pub mod splitter;

pub use condense::{CondenseConfig, CondenseStrategy};
pub use config::{OutputMode, ValuationConfig, ValuationConfigBuilder};
pub use document::{Document, DocumentFormat};
pub use error::{Result, ValuationError};
pub use loader::{DocumentLoader, PdfExtractor, PdfTextExtractor};
pub use output::{DEFAULT_RESULTS_DIR, ResultWriter};
pub use pipeline::{ValuationPipeline, ValuationRequest};
pub use result::{
    NOT_AVAILABLE, Revenue, StructuredValuation, UnparsedOutput, ValuationReport, ValuationResult,
};
pub use sampling::{Sample, sample};
pub use splitter::{TextSplitter, split_documents};

// Re-exported so callers can configure providers and templates without
// depending on the lower crates directly
pub use finagent_llm::{LLMProvider, ProviderKind};
pub use finagent_prompt::{BuiltinTemplate, TemplateSource};
