//! Conversation loop errors

use careeragent_llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("language model request failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("language model did not answer within {secs}s")]
    Timeout { secs: u64 },

    #[error("turn cancelled")]
    Cancelled,

    #[error("conversation history is inconsistent: {0}")]
    InvalidHistory(#[from] careeragent_core::Error),
}

impl AgentError {
    /// Whether the user should be offered a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Upstream(e) => e.is_retryable(),
            AgentError::Timeout { .. } => true,
            AgentError::Cancelled | AgentError::InvalidHistory(_) => false,
        }
    }
}
