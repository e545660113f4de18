//! Supported LLM vendors

use crate::LLMError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remote LLM vendor exposing an OpenAI-compatible endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// api.openai.com
    #[default]
    OpenAI,
    /// api.deepseek.com
    DeepSeek,
}

impl ProviderKind {
    /// Short identifier, also used as the provider name in logs
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    /// Default API base URL
    pub fn default_api_base(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "https://api.openai.com/v1",
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    /// Environment variable holding the credential
    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Environment variable overriding the API base URL
    pub fn api_base_env(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_BASE",
            ProviderKind::DeepSeek => "DEEPSEEK_API_BASE",
        }
    }

    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o",
            ProviderKind::DeepSeek => "deepseek-reasoner",
        }
    }

    /// Whether the vendor accepts `response_format: {"type": "json_object"}`
    ///
    /// `deepseek-reasoner` rejects it, so DeepSeek requests never carry it.
    pub fn supports_json_mode(self) -> bool {
        matches!(self, ProviderKind::OpenAI)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            other => Err(LLMError::ConfigurationError(format!(
                "Unknown provider '{other}' (expected 'openai' or 'deepseek')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!(" DeepSeek ".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
        assert!("anthropic".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(ProviderKind::default(), ProviderKind::OpenAI);
        assert_eq!(ProviderKind::OpenAI.api_key_env(), "OPENAI_API_KEY");
        assert_eq!(ProviderKind::DeepSeek.api_key_env(), "DEEPSEEK_API_KEY");
        assert_eq!(ProviderKind::DeepSeek.default_model(), "deepseek-reasoner");
        assert!(ProviderKind::DeepSeek.default_api_base().starts_with("https://api.deepseek.com"));
        assert!(!ProviderKind::DeepSeek.supports_json_mode());
    }
}
