//! Valuation results and response interpretation

use crate::config::OutputMode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Value used for any valuation field the model did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Message stored in the `error` field of an unparsed result
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse valuation";

/// Outcome of one valuation call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValuationResult {
    /// JSON object returned by the model, kept exactly as received
    Structured(StructuredValuation),
    /// Response text in raw mode
    Raw(String),
    /// Structured mode response that was not a JSON object
    Unparsed(UnparsedOutput),
}

impl ValuationResult {
    /// Interpret response text under the given contract
    pub fn interpret(raw: &str, mode: OutputMode) -> Self {
        match mode {
            OutputMode::Raw => ValuationResult::Raw(raw.to_string()),
            OutputMode::Structured => match extract_json_object(raw) {
                Ok(map) => ValuationResult::Structured(StructuredValuation(map)),
                Err(detail) => {
                    warn!(%detail, "Model response is not a JSON object");
                    ValuationResult::Unparsed(UnparsedOutput {
                        error: PARSE_FAILURE_MESSAGE.to_string(),
                        raw_output: raw.to_string(),
                        detail,
                    })
                }
            },
        }
    }

    /// True for an unparsed structured response
    pub fn is_error(&self) -> bool {
        matches!(self, ValuationResult::Unparsed(_))
    }

    pub fn as_structured(&self) -> Option<&StructuredValuation> {
        match self {
            ValuationResult::Structured(valuation) => Some(valuation),
            _ => None,
        }
    }

    /// The model's text as received, when it was not parsed
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ValuationResult::Structured(_) => None,
            ValuationResult::Raw(text) => Some(text),
            ValuationResult::Unparsed(unparsed) => Some(&unparsed.raw_output),
        }
    }

    /// File extension for [`ValuationResult::render`] output
    pub fn output_extension(&self) -> &'static str {
        match self {
            ValuationResult::Raw(_) => "md",
            ValuationResult::Structured(_) | ValuationResult::Unparsed(_) => "json",
        }
    }

    /// Text to write to disk: pretty JSON, or the raw response
    pub fn render(&self) -> String {
        match self {
            ValuationResult::Structured(valuation) => valuation.to_pretty_json(),
            ValuationResult::Raw(text) => text.clone(),
            ValuationResult::Unparsed(unparsed) => {
                let value = serde_json::json!({
                    "error": unparsed.error,
                    "raw_output": unparsed.raw_output,
                });
                format!("{value:#}")
            }
        }
    }
}

/// Structured-mode response that failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnparsedOutput {
    /// Always [`PARSE_FAILURE_MESSAGE`]
    pub error: String,
    /// Response text, verbatim
    pub raw_output: String,
    /// Parser diagnostic
    #[serde(skip)]
    pub detail: String,
}

/// The JSON object returned by the model
///
/// The map is stored unchanged, so serialising and re-parsing yields the same
/// mapping. Field defaults are applied only by the accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredValuation(Map<String, Value>);

impl StructuredValuation {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// A top-level field as text, or `"N/A"`
    pub fn field(&self, key: &str) -> String {
        display_value(self.0.get(key))
    }

    pub fn company_name(&self) -> String {
        self.field("company_name")
    }

    pub fn ticker(&self) -> String {
        self.field("ticker")
    }

    /// Typed view of the well-known valuation fields
    pub fn report(&self) -> ValuationReport {
        let revenue = self.0.get("revenue");
        let (current, growth_rate) = match revenue {
            Some(Value::Object(obj)) => (
                display_value(obj.get("current")),
                display_value(obj.get("growth_rate")),
            ),
            other => (display_value(other), NOT_AVAILABLE.to_string()),
        };

        ValuationReport {
            company_name: self.field("company_name"),
            ticker: self.field("ticker"),
            market_cap: self.field("market_cap"),
            pe_ratio: self.field("pe_ratio"),
            revenue: Revenue {
                current,
                growth_rate,
            },
            eps: self.field("eps"),
            debt_to_equity: self.field("debt_to_equity"),
            free_cash_flow: self.field("free_cash_flow"),
            dividend_yield: self.field("dividend_yield"),
            estimated_fair_value: self.field("estimated_fair_value"),
            valuation_methodology: self.field("valuation_methodology"),
            risk_factors: list_value(self.0.get("risk_factors")),
        }
    }

    fn to_pretty_json(&self) -> String {
        format!("{:#}", Value::Object(self.0.clone()))
    }
}

/// Revenue figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revenue {
    pub current: String,
    pub growth_rate: String,
}

/// Well-known valuation fields with `"N/A"` for anything missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub company_name: String,
    pub ticker: String,
    pub market_cap: String,
    pub pe_ratio: String,
    pub revenue: Revenue,
    pub eps: String,
    pub debt_to_equity: String,
    pub free_cash_flow: String,
    pub dividend_yield: String,
    pub estimated_fair_value: String,
    pub valuation_methodology: String,
    /// Empty when the model listed none
    pub risk_factors: Vec<String>,
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_value(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn list_value(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|item| display_value(Some(item))).collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => vec![display_value(Some(other))],
    }
}

/// Best-effort extraction of a JSON object from model output
///
/// Tries the whole text, then the body of a Markdown code fence, then the
/// outermost `{...}` slice. Returns the first parse error if all fail.
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>, String> {
    let trimmed = raw.trim();

    let first_error = match parse_object(trimmed) {
        Ok(map) => return Ok(map),
        Err(e) => e,
    };

    if let Some(body) = strip_code_fence(trimmed) {
        if let Ok(map) = parse_object(body) {
            return Ok(map);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(map) = parse_object(&trimmed[start..=end]) {
                return Ok(map);
            }
        }
    }

    Err(first_error)
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // Skip the info string (e.g. "json") on the opening line
    let body_start = rest.find('\n')? + 1;
    let body = rest[body_start..].trim_end();
    Some(body.strip_suffix("```").unwrap_or(body).trim())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(value: Value) -> StructuredValuation {
        match value {
            Value::Object(map) => StructuredValuation::new(map),
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_interpret_json() {
        let raw = r#"{"company_name": "Acme Corp", "ticker": "ACME", "pe_ratio": 18.5}"#;
        let result = ValuationResult::interpret(raw, OutputMode::Structured);

        let valuation = result.as_structured().unwrap();
        assert_eq!(valuation.company_name(), "Acme Corp");
        assert_eq!(valuation.field("pe_ratio"), "18.5");
        assert_eq!(valuation.field("market_cap"), NOT_AVAILABLE);
        assert!(!result.is_error());
        assert_eq!(result.output_extension(), "json");
    }

    #[test]
    fn test_interpret_fenced_json() {
        let raw = "```json\n{\"ticker\": \"ACME\"}\n```";
        let result = ValuationResult::interpret(raw, OutputMode::Structured);
        assert_eq!(result.as_structured().unwrap().ticker(), "ACME");
    }

    #[test]
    fn test_interpret_json_with_preamble() {
        let raw = "Here is the analysis:\n\
                   {\"ticker\": \"ACME\", \"revenue\": {\"current\": \"$10M\"}}\n\
                   Thanks!";
        let result = ValuationResult::interpret(raw, OutputMode::Structured);
        let report = result.as_structured().unwrap().report();
        assert_eq!(report.revenue.current, "$10M");
        assert_eq!(report.revenue.growth_rate, NOT_AVAILABLE);
    }

    #[test]
    fn test_interpret_non_json() {
        let raw = "I cannot value this company without more data.";
        let result = ValuationResult::interpret(raw, OutputMode::Structured);

        assert!(result.is_error());
        assert_eq!(result.raw_text(), Some(raw));
        match &result {
            ValuationResult::Unparsed(unparsed) => {
                assert_eq!(unparsed.error, PARSE_FAILURE_MESSAGE);
                assert!(!unparsed.detail.is_empty());
            }
            other => panic!("expected unparsed, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_json_array_is_unparsed() {
        let result = ValuationResult::interpret("[1, 2, 3]", OutputMode::Structured);
        match result {
            ValuationResult::Unparsed(unparsed) => {
                assert_eq!(unparsed.detail, "expected a JSON object, found an array");
            }
            other => panic!("expected unparsed, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_raw_mode() {
        let raw = "# Valuation\n\n{\"not\": \"parsed\"}";
        let result = ValuationResult::interpret(raw, OutputMode::Raw);
        assert_eq!(result, ValuationResult::Raw(raw.to_string()));
        assert_eq!(result.render(), raw);
        assert_eq!(result.output_extension(), "md");
    }

    #[test]
    fn test_unparsed_serialization() {
        let result = ValuationResult::interpret("oops", OutputMode::Structured);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({ "error": "Failed to parse valuation", "raw_output": "oops" })
        );

        let rendered: Value = serde_json::from_str(&result.render()).unwrap();
        assert_eq!(rendered, value);
    }

    #[test]
    fn test_structured_round_trip() {
        let original = json!({
            "company_name": "Acme Corp",
            "revenue": { "current": "$10M", "growth_rate": "20%" },
            "risk_factors": ["Customer concentration"],
            "extra_field": { "nested": [1, 2.5, null] }
        });
        let result = ValuationResult::interpret(&original.to_string(), OutputMode::Structured);

        let rendered: Value = serde_json::from_str(&result.render()).unwrap();
        assert_eq!(rendered, original);
        assert_eq!(serde_json::to_value(&result).unwrap(), original);
    }

    #[test]
    fn test_report_defaults() {
        let report = structured(json!({ "ticker": "ACME" })).report();

        assert_eq!(report.ticker, "ACME");
        assert_eq!(report.company_name, NOT_AVAILABLE);
        assert_eq!(report.revenue.current, NOT_AVAILABLE);
        assert_eq!(report.revenue.growth_rate, NOT_AVAILABLE);
        assert!(report.risk_factors.is_empty());
    }

    #[test]
    fn test_report_value_shapes() {
        let report = structured(json!({
            "revenue": "$10M",
            "eps": 1.25,
            "dividend_yield": null,
            "market_cap": "",
            "risk_factors": "Single supplier"
        }))
        .report();

        assert_eq!(report.revenue.current, "$10M");
        assert_eq!(report.eps, "1.25");
        assert_eq!(report.dividend_yield, NOT_AVAILABLE);
        assert_eq!(report.market_cap, NOT_AVAILABLE);
        assert_eq!(report.risk_factors, vec!["Single supplier".to_string()]);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), Some("{}"));
        assert_eq!(strip_code_fence("```\n{\"a\":1}```"), Some("{\"a\":1}"));
        assert_eq!(strip_code_fence("{}"), None);
    }
}
