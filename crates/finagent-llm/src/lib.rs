//! LLM provider abstraction layer for finagent
//!
//! This crate provides provider-agnostic abstractions for talking to hosted
//! chat-completion models. It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Provider trait for LLM implementations
//! - An OpenAI-compatible provider with OpenAI and DeepSeek presets

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;

// Re-export main types
pub use completion::{
    CompletionRequest, CompletionRequestBuilder, CompletionResponse, ResponseFormat, StopReason,
    TokenUsage,
};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;
pub use providers::{OpenAIConfig, OpenAIProvider, ProviderKind};
