//! Configuration for valuation runs

use crate::condense::CondenseConfig;
use crate::error::{Result, ValuationError};
use finagent_llm::ProviderKind;
use finagent_prompt::{BuiltinTemplate, OutputHint, TemplateSource};
use finagent_utils::env_non_empty;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the model response is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Expect a JSON object with valuation fields
    #[default]
    Structured,
    /// Return the response text unchanged
    Raw,
}

impl From<OutputHint> for OutputMode {
    fn from(hint: OutputHint) -> Self {
        match hint {
            OutputHint::Json => OutputMode::Structured,
            OutputHint::Markdown => OutputMode::Raw,
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::Structured => "structured",
            OutputMode::Raw => "raw",
        })
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" | "json" => Ok(OutputMode::Structured),
            "raw" | "text" | "markdown" => Ok(OutputMode::Raw),
            other => Err(format!("unknown output mode '{other}'")),
        }
    }
}

/// Configuration for a valuation pipeline
#[derive(Debug, Clone)]
pub struct ValuationConfig {
    /// Vendor preset (base URL, credential variable, default model)
    pub provider: ProviderKind,

    /// Model identifier sent with every request
    pub model: String,

    /// API key; `None` until set explicitly or read from the environment
    pub api_key: Option<String>,

    /// Base URL override
    pub api_base: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token limit; provider default when `None`
    pub max_tokens: Option<usize>,

    /// Deadline for each model call
    pub request_timeout: Duration,

    /// Response contract
    pub output_mode: OutputMode,

    /// Prompt template
    pub template: TemplateSource,

    /// Pre-pass for long or multi-page input
    pub condense: CondenseConfig,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: ProviderKind::OpenAI.default_model().to_string(),
            api_key: None,
            api_base: None,
            temperature: 0.0,
            max_tokens: None,
            request_timeout: Duration::from_secs(120),
            output_mode: OutputMode::Structured,
            template: TemplateSource::Builtin(BuiltinTemplate::Structured),
            condense: CondenseConfig::default(),
        }
    }
}

impl ValuationConfig {
    /// Create a new configuration builder
    pub fn builder() -> ValuationConfigBuilder {
        ValuationConfigBuilder::default()
    }

    /// Fill the API key from the provider's environment variable if unset
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = env_non_empty(self.provider.api_key_env());
        }
        self
    }

    /// Base URL to use: explicit override, then `*_API_BASE`, then the preset
    pub fn resolved_api_base(&self) -> String {
        self.api_base
            .clone()
            .or_else(|| env_non_empty(self.provider.api_base_env()))
            .unwrap_or_else(|| self.provider.default_api_base().to_string())
    }

    /// Validate everything except the credential
    pub fn validate_settings(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ValuationError::Configuration(
                "model identifier must not be empty".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ValuationError::Configuration(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValuationError::Configuration(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        self.condense.validate()
    }

    /// Validate the configuration, including the API key
    pub fn validate(&self) -> Result<()> {
        self.validate_settings()?;
        self.api_key()?;
        Ok(())
    }

    /// The configured API key, or a configuration error naming the variable
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ValuationError::Configuration(format!(
                    "no API key for provider '{}': set {} or pass one explicitly",
                    self.provider,
                    self.provider.api_key_env()
                ))
            })
    }
}

/// Builder for ValuationConfig
#[derive(Debug, Default)]
pub struct ValuationConfigBuilder {
    provider: Option<ProviderKind>,
    model: Option<String>,
    api_key: Option<String>,
    api_base: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    request_timeout: Option<Duration>,
    output_mode: Option<OutputMode>,
    template: Option<TemplateSource>,
    condense: Option<CondenseConfig>,
    env_api_key: bool,
}

impl ValuationConfigBuilder {
    /// Set the provider; also selects its default model unless one is set
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = Some(mode);
        self
    }

    /// Set the template; the output mode follows the built-in's hint unless
    /// set explicitly
    pub fn template(mut self, template: impl Into<TemplateSource>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn condense(mut self, condense: CondenseConfig) -> Self {
        self.condense = Some(condense);
        self
    }

    /// Read the API key from the provider's environment variable at build time
    pub fn with_env_api_key(mut self) -> Self {
        self.env_api_key = true;
        self
    }

    /// Build the configuration
    ///
    /// Settings are validated here; a missing API key is reported when the
    /// pipeline is created.
    pub fn build(self) -> Result<ValuationConfig> {
        let defaults = ValuationConfig::default();
        let provider = self.provider.unwrap_or(defaults.provider);
        let template = self.template.unwrap_or(defaults.template);

        let output_mode = self.output_mode.unwrap_or(match &template {
            TemplateSource::Builtin(builtin) => builtin.default_output_mode_hint().into(),
            TemplateSource::File(_) => defaults.output_mode,
        });

        let mut config = ValuationConfig {
            provider,
            model: self
                .model
                .unwrap_or_else(|| provider.default_model().to_string()),
            api_key: self.api_key,
            api_base: self.api_base,
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            output_mode,
            template,
            condense: self.condense.unwrap_or(defaults.condense),
        };

        if self.env_api_key {
            config = config.with_env_api_key();
        }

        config.validate_settings()?;
        Ok(config)
    }
}
