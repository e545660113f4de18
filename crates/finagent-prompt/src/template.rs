//! MiniJinja-backed valuation template
//!
//! A valuation template is a prompt with exactly one substitution point, the
//! document text. The template is compiled once at construction so malformed
//! sources and stray variables are rejected before any document is loaded.

use crate::{PromptError, Result};
use minijinja::{Environment, context};
use std::collections::BTreeSet;
use tracing::debug;

/// Name of the single variable every valuation template must reference
pub const TEXT_VARIABLE: &str = "text";

/// A prompt template with a single `{{ text }}` placeholder
///
/// # Template Syntax
///
/// Standard Jinja2 syntax as implemented by MiniJinja. Only the `text`
/// variable is available; filters such as `{{ text | trim }}` are allowed.
///
/// # Examples
///
/// ```
/// use finagent_prompt::ValuationTemplate;
///
/// let template = ValuationTemplate::new("inline", "Analyze:\n{{ text }}").unwrap();
/// let prompt = template.render("Revenue: $10M").unwrap();
/// assert_eq!(prompt, "Analyze:\nRevenue: $10M");
/// ```
#[derive(Clone)]
pub struct ValuationTemplate {
    name: String,
    source: String,
}

impl ValuationTemplate {
    /// Compile and validate a template
    ///
    /// # Arguments
    ///
    /// * `name` - Identifier used in errors and logs
    /// * `source` - Jinja source referencing `text` and nothing else
    ///
    /// # Returns
    ///
    /// `PromptError::TemplateParseFailed` for syntax errors and
    /// `PromptError::InvalidPlaceholder` when the variable set is not exactly
    /// `{text}`.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let env = Environment::new();
        let compiled =
            env.template_from_str(&source)
                .map_err(|e| PromptError::TemplateParseFailed {
                    name: name.clone(),
                    detail: e.to_string(),
                })?;

        let found: BTreeSet<String> = compiled.undeclared_variables(false).into_iter().collect();
        if found.len() != 1 || !found.contains(TEXT_VARIABLE) {
            return Err(PromptError::InvalidPlaceholder {
                name,
                found: found.into_iter().collect(),
            });
        }

        debug!(template = %name, chars = source.chars().count(), "Compiled valuation template");
        Ok(Self { name, source })
    }

    /// Template identifier
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw Jinja source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute the document text into the template
    pub fn render(&self, text: &str) -> Result<String> {
        let env = Environment::new();
        env.render_str(&self.source, context! { text => text })
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }
}

impl std::fmt::Debug for ValuationTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationTemplate")
            .field("name", &self.name)
            .field("chars", &self.source.chars().count())
            .finish()
    }
}
