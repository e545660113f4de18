//! Built-in valuation templates embedded at compile time

use crate::{Result, ValuationTemplate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const STRUCTURED_SOURCE: &str = include_str!("../templates/valuation_structured.jinja");
const REPORT_SOURCE: &str = include_str!("../templates/valuation_report_zh.jinja");

/// Response shape a template was written to elicit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputHint {
    /// A single JSON object with the valuation fields
    Json,
    /// Free-form Markdown report
    Markdown,
}

/// Templates shipped with the crate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinTemplate {
    /// English analyst prompt asking for the twelve valuation fields as JSON
    #[default]
    Structured,
    /// Long-form Chinese investment-bank valuation report (Markdown + LaTeX)
    Report,
}

impl BuiltinTemplate {
    /// Stable identifier, also accepted by [`FromStr`]
    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinTemplate::Structured => "structured",
            BuiltinTemplate::Report => "report",
        }
    }

    /// Raw Jinja source of the template
    pub fn source(self) -> &'static str {
        match self {
            BuiltinTemplate::Structured => STRUCTURED_SOURCE,
            BuiltinTemplate::Report => REPORT_SOURCE,
        }
    }

    /// Which response mode this template was written for
    pub fn default_output_mode_hint(self) -> OutputHint {
        match self {
            BuiltinTemplate::Structured => OutputHint::Json,
            BuiltinTemplate::Report => OutputHint::Markdown,
        }
    }

    /// Compile the embedded source
    pub fn template(self) -> Result<ValuationTemplate> {
        ValuationTemplate::new(self.as_str(), self.source())
    }
}

impl fmt::Display for BuiltinTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinTemplate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" | "json" => Ok(BuiltinTemplate::Structured),
            "report" | "markdown" => Ok(BuiltinTemplate::Report),
            other => Err(format!(
                "unknown template '{other}' (expected 'structured' or 'report')"
            )),
        }
    }
}
