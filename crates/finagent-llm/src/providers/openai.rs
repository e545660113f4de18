//! OpenAI-compatible provider implementation
//!
//! This module implements the LLMProvider trait on top of the chat
//! completions API. See: https://platform.openai.com/docs/api-reference/chat
//!
//! DeepSeek exposes the same protocol, so it is served by this provider with
//! a different [`ProviderKind`] preset.
//!
//! # Examples
//!
//! ## Credential from the environment
//!
//! ```no_run
//! use finagent_llm::{CompletionRequest, LLMProvider, Message, ProviderKind};
//! use finagent_llm::providers::OpenAIProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads DEEPSEEK_API_KEY (and DEEPSEEK_API_BASE if set)
//!     let provider = OpenAIProvider::from_env(ProviderKind::DeepSeek)?;
//!
//!     let request = CompletionRequest::builder("deepseek-reasoner")
//!         .add_message(Message::user("Summarise this filing"))
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Custom configuration
//!
//! ```no_run
//! use finagent_llm::providers::{OpenAIConfig, OpenAIProvider};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OpenAIConfig::new("sk-...")
//!     .with_api_base("http://localhost:8000/v1")
//!     .with_timeout(Duration::from_secs(60));
//!
//! let provider = OpenAIProvider::with_config(config)?;
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, ProviderKind,
    ResponseFormat, Result, Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use finagent_utils::env_non_empty;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Vendor preset this configuration was derived from
    pub kind: ProviderKind,

    /// API key for authentication
    pub api_key: String,

    /// Base URL for the API (default depends on `kind`)
    pub api_base: String,

    /// Request timeout (default: 120s)
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Create a new OpenAI config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::for_provider(ProviderKind::OpenAI, api_key)
    }

    /// Create a config for a vendor preset
    pub fn for_provider(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            api_base: kind.default_api_base().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from the vendor's key variable (`OPENAI_API_KEY`,
    /// `DEEPSEEK_API_KEY`) and the optional base URL override
    /// (`OPENAI_API_BASE`, `DEEPSEEK_API_BASE`).
    pub fn from_env(kind: ProviderKind) -> Result<Self> {
        let api_key = env_non_empty(kind.api_key_env()).ok_or_else(|| {
            LLMError::ConfigurationError(format!(
                "{} environment variable not set",
                kind.api_key_env()
            ))
        })?;

        let api_base = env_non_empty(kind.api_base_env())
            .unwrap_or_else(|| kind.default_api_base().to_string());

        Ok(Self::for_provider(kind, api_key).with_api_base(api_base))
    }

    /// Set custom API base URL
    ///
    /// Useful for proxies, Azure deployments and local OpenAI-compatible
    /// servers. A trailing slash is dropped.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI-compatible chat completions provider
///
/// One instance owns one pooled HTTP client, so it is cheap to share behind
/// an `Arc` across concurrent analyses.
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    ///
    /// Fails with [`LLMError::ConfigurationError`] when the API key is blank,
    /// so a missing credential is reported before any request is built.
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(format!(
                "No API key configured for provider '{}' (set {})",
                config.kind,
                config.kind.api_key_env()
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Create an OpenAI provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env(kind: ProviderKind) -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env(kind)?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn map_transport_error(&self, err: reqwest::Error) -> LLMError {
        if err.is_timeout() {
            LLMError::Timeout(self.config.timeout)
        } else {
            LLMError::HttpError(err)
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(provider = %self.config.kind, model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to {}", self.config.api_base);

        let response_format = match request.response_format {
            ResponseFormat::JsonObject if self.config.kind.supports_json_mode() => {
                Some(OpenAIResponseFormat {
                    format_type: "json_object".to_string(),
                })
            }
            _ => None,
        };

        let openai_request = OpenAIRequest {
            model: request.model.clone(),
            messages: build_openai_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        // Only the first choice is used
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let usage = openai_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Received completion"
        );

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            stop_reason: map_stop_reason(choice.finish_reason.as_deref()),
            usage,
            reasoning: choice.message.reasoning_content,
        })
    }

    fn name(&self) -> &str {
        self.config.kind.as_str()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// System prompt goes first in the messages array
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    system
        .map(Message::system)
        .into_iter()
        .chain(messages)
        .map(|msg| OpenAIMessage {
            role: msg.role.as_str(),
            content: msg.content,
        })
        .collect()
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => {
            debug!("Content filtered by provider safety systems");
            StopReason::ContentFilter
        }
        Some("stop") | None => StopReason::EndTurn,
        Some(other) => {
            debug!("Unknown stop reason: {}", other);
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
        })
    }

    fn provider_for(server: &MockServer, kind: ProviderKind) -> OpenAIProvider {
        let config = OpenAIConfig::for_provider(kind, "test-key").with_api_base(server.uri());
        OpenAIProvider::with_config(config).unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(provider.config().api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_blank_key_is_configuration_error() {
        let result = OpenAIProvider::with_config(OpenAIConfig::for_provider(
            ProviderKind::DeepSeek,
            "  ",
        ));
        assert!(matches!(
            result,
            Err(LLMError::ConfigurationError(msg)) if msg.contains("DEEPSEEK_API_KEY")
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAIConfig::new("test-key")
            .with_api_base("https://proxy.example.com/v1/")
            .with_timeout(Duration::from_millis(1500));

        assert_eq!(config.api_base, "https://proxy.example.com/v1");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(OpenAIConfig::new("k").timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_config_from_env() {
        unsafe {
            std::env::set_var("DEEPSEEK_API_KEY", "ds-key-from-env");
            std::env::set_var("DEEPSEEK_API_BASE", "https://ds.proxy.example.com/v1");
        }

        let config = OpenAIConfig::from_env(ProviderKind::DeepSeek).unwrap();
        assert_eq!(config.kind, ProviderKind::DeepSeek);
        assert_eq!(config.api_key, "ds-key-from-env");
        assert_eq!(config.api_base, "https://ds.proxy.example.com/v1");

        // A blank override falls back to the preset
        unsafe {
            std::env::set_var("DEEPSEEK_API_BASE", "  ");
        }
        let config = OpenAIConfig::from_env(ProviderKind::DeepSeek).unwrap();
        assert_eq!(config.api_base, "https://api.deepseek.com/v1");

        unsafe {
            std::env::remove_var("DEEPSEEK_API_KEY");
            std::env::remove_var("DEEPSEEK_API_BASE");
        }
    }

    #[test]
    fn test_from_env_without_key() {
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
        }
        let result = OpenAIProvider::from_env(ProviderKind::OpenAI);
        assert!(matches!(result, Err(LLMError::ConfigurationError(_))));
    }

    #[test]
    fn test_system_message_first() {
        let messages = build_openai_messages(
            Some("You are an analyst".to_string()),
            vec![Message::user("Value ACME")],
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "You are an analyst");
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(map_stop_reason(Some("length")), StopReason::MaxTokens);
        assert_eq!(map_stop_reason(Some("content_filter")), StopReason::ContentFilter);
        assert_eq!(map_stop_reason(Some("unknown")), StopReason::EndTurn);
        assert_eq!(map_stop_reason(None), StopReason::EndTurn);
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("{\"ticker\":\"ACME\"}")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, ProviderKind::OpenAI);
        let request = CompletionRequest::builder("gpt-4o")
            .add_message(Message::user("hi"))
            .response_format(ResponseFormat::JsonObject)
            .build();

        let response = provider.complete(request).await.unwrap();
        assert_eq!(response.text(), "{\"ticker\":\"ACME\"}");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total(), 17);
        assert!(response.reasoning.is_none());
    }

    #[tokio::test]
    async fn test_deepseek_reasoning_and_missing_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "# Report",
                        "reasoning_content": "thinking..."
                    },
                    "finish_reason": "length"
                }]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, ProviderKind::DeepSeek);
        let request = CompletionRequest::builder("deepseek-reasoner")
            .add_message(Message::user("hi"))
            .response_format(ResponseFormat::JsonObject)
            .build();

        let response = provider.complete(request).await.unwrap();
        assert_eq!(provider.name(), "deepseek");
        assert_eq!(response.text(), "# Report");
        assert_eq!(response.reasoning.as_deref(), Some("thinking..."));
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert_eq!(response.usage, TokenUsage::default());

        // JSON mode is never sent to DeepSeek
        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, ProviderKind::OpenAI);
        let request = || {
            CompletionRequest::builder("gpt-4o")
                .add_message(Message::user("hi"))
                .build()
        };

        assert!(matches!(
            provider.complete(request()).await,
            Err(LLMError::AuthenticationFailed)
        ));
        assert!(matches!(
            provider.complete(request()).await,
            Err(LLMError::RateLimitExceeded(body)) if body == "quota"
        ));
        assert!(matches!(
            provider.complete(request()).await,
            Err(LLMError::RequestFailed(msg)) if msg.contains("503")
        ));
    }

    #[tokio::test]
    async fn test_no_choices_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, ProviderKind::OpenAI);
        let request = CompletionRequest::builder("gpt-4o").build();
        assert!(matches!(
            provider.complete(request).await,
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = OpenAIConfig::new("test-key")
            .with_api_base(server.uri())
            .with_timeout(Duration::from_millis(500));
        let provider = OpenAIProvider::with_config(config).unwrap();

        let result = provider.complete(CompletionRequest::builder("gpt-4o").build()).await;
        assert!(matches!(result, Err(LLMError::Timeout(t)) if t == Duration::from_millis(500)));
    }
}
