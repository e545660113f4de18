//! Valuation prompt templates for finagent
//!
//! Every template has exactly one substitution point, `{{ text }}`, which
//! receives the (possibly condensed) document text.
//!
//! # Quick Start
//!
//! ```
//! use finagent_prompt::{BuiltinTemplate, TemplateSource};
//!
//! let template = TemplateSource::Builtin(BuiltinTemplate::Structured).load().unwrap();
//! let prompt = template.render("Revenue: $10M, up 20% YoY").unwrap();
//! assert!(prompt.contains("Revenue: $10M, up 20% YoY"));
//! ```

mod builtin;
mod error;
mod loader;
mod template;

pub use builtin::{BuiltinTemplate, OutputHint};
pub use error::{PromptError, Result};
pub use loader::TemplateSource;
pub use template::{TEXT_VARIABLE, ValuationTemplate};
