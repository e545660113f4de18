//! Valuation pipeline
//!
//! One analysis is: concatenate (or condense) the document text, substitute it
//! into the template, make one completion call, interpret the response under
//! the configured output mode. Nothing is retried.

use crate::condense;
use crate::config::{OutputMode, ValuationConfig};
use crate::document::Document;
use crate::error::{Result, ValuationError};
use crate::loader::DocumentLoader;
use crate::result::ValuationResult;
use finagent_llm::{
    CompletionRequest, LLMError, LLMProvider, Message, OpenAIConfig, OpenAIProvider,
    ResponseFormat,
};
use finagent_prompt::ValuationTemplate;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A rendered prompt ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValuationRequest {
    pub rendered_prompt: String,
    pub model_identifier: String,
}

/// Configured valuation pipeline
///
/// Immutable after construction and safe to share behind an `Arc` across
/// concurrent analyses.
pub struct ValuationPipeline {
    config: ValuationConfig,
    provider: Arc<dyn LLMProvider>,
    template: ValuationTemplate,
    loader: DocumentLoader,
}

impl ValuationPipeline {
    /// Create a pipeline talking to the configured OpenAI-compatible endpoint
    ///
    /// A missing API key is a `Configuration` error; no request is made.
    pub fn new(config: ValuationConfig) -> Result<Self> {
        config.validate()?;

        let openai = OpenAIConfig::for_provider(config.provider, config.api_key()?)
            .with_api_base(config.resolved_api_base())
            .with_timeout(config.request_timeout);
        let provider = OpenAIProvider::with_config(openai)?;

        Self::with_provider(Arc::new(provider), config)
    }

    /// Create a pipeline around an existing provider
    ///
    /// The credential check is skipped; everything else is validated.
    pub fn with_provider(provider: Arc<dyn LLMProvider>, config: ValuationConfig) -> Result<Self> {
        config.validate_settings()?;
        let template = config.template.load()?;

        info!(
            provider = %config.provider,
            model = %config.model,
            mode = %config.output_mode,
            template = template.name(),
            "Valuation pipeline ready"
        );

        Ok(Self {
            config,
            provider,
            template,
            loader: DocumentLoader::new(),
        })
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    pub fn template(&self) -> &ValuationTemplate {
        &self.template
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// Build the request for these documents
    ///
    /// Runs the condensing pre-pass, which may call the model.
    pub async fn prepare(&self, documents: &[Document]) -> Result<ValuationRequest> {
        if documents.is_empty() {
            return Err(ValuationError::EmptyInput);
        }

        let text = condense::prepare_text(self, documents).await?;
        let rendered_prompt = self.template.render(&text)?;
        debug!(
            input_chars = text.chars().count(),
            prompt_chars = rendered_prompt.chars().count(),
            "Rendered valuation prompt"
        );

        Ok(ValuationRequest {
            rendered_prompt,
            model_identifier: self.config.model.clone(),
        })
    }

    /// Send a prepared request and interpret the response
    #[instrument(skip_all, fields(model = %request.model_identifier))]
    pub async fn execute(&self, request: ValuationRequest) -> Result<ValuationResult> {
        let format = self.response_format(&request.rendered_prompt);
        let text = self
            .complete_text_for(request.model_identifier, request.rendered_prompt, format)
            .await?;

        let result = ValuationResult::interpret(&text, self.config.output_mode);
        info!(
            is_error = result.is_error(),
            extension = result.output_extension(),
            "Valuation complete"
        );
        Ok(result)
    }

    /// Analyze already-loaded documents
    pub async fn analyze(&self, documents: &[Document]) -> Result<ValuationResult> {
        let request = self.prepare(documents).await?;
        self.execute(request).await
    }

    /// Load a file and analyze it
    ///
    /// Load errors are returned before any model call.
    pub async fn analyze_file(&self, path: impl AsRef<Path>) -> Result<ValuationResult> {
        let documents = self.loader.load(path).await?;
        self.analyze(&documents).await
    }

    /// JSON mode only for structured output, on providers that support it, and
    /// when the prompt mentions JSON (OpenAI rejects JSON mode otherwise)
    fn response_format(&self, prompt: &str) -> ResponseFormat {
        let wants_json = self.config.output_mode == OutputMode::Structured
            && self.config.provider.supports_json_mode()
            && prompt.to_ascii_lowercase().contains("json");

        if wants_json {
            ResponseFormat::JsonObject
        } else {
            ResponseFormat::Text
        }
    }

    /// One completion call with the configured model, bounded by the timeout
    pub(crate) async fn complete_text(
        &self,
        prompt: String,
        format: ResponseFormat,
    ) -> Result<String> {
        self.complete_text_for(self.config.model.clone(), prompt, format)
            .await
    }

    async fn complete_text_for(
        &self,
        model: String,
        prompt: String,
        format: ResponseFormat,
    ) -> Result<String> {
        let request = CompletionRequest::builder(model)
            .add_message(Message::user(prompt))
            .temperature(self.config.temperature)
            .max_tokens_opt(self.config.max_tokens)
            .response_format(format)
            .build();

        let timeout = self.config.request_timeout;
        let response = tokio::time::timeout(timeout, self.provider.complete(request))
            .await
            .map_err(|_| ValuationError::Upstream(LLMError::Timeout(timeout)))?
            .map_err(ValuationError::Upstream)?;

        debug!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            has_reasoning = response.reasoning.is_some(),
            "Completion received"
        );

        Ok(response.message.content)
    }
}

impl std::fmt::Debug for ValuationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationPipeline")
            .field("provider", &self.config.provider)
            .field("model", &self.config.model)
            .field("output_mode", &self.config.output_mode)
            .field("template", &self.template.name())
            .finish_non_exhaustive()
    }
}
