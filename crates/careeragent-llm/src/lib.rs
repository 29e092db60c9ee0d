//! Careeragent LLM - Provider adapters with streaming support

pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use provider::{LlmError, LlmProvider, LlmResult, LlmStream};
pub use types::*;
