//! Concrete LLM provider implementations
//!
//! Both supported vendors speak the OpenAI chat-completions protocol, so a
//! single provider implementation serves them; [`ProviderKind`] only selects
//! endpoint, credential variable and default model.

pub mod kind;
pub mod openai;

pub use kind::ProviderKind;
pub use openai::{OpenAIConfig, OpenAIProvider};
