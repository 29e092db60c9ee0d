//! Careeragent Agent - the conversation loop that answers as the profile owner

pub mod error;
pub mod prompt;
pub mod runtime;

pub use error::AgentError;
pub use prompt::build_system_prompt;
pub use runtime::{sanitize_history, AgentConfig, CareerAgent, Outcome, Turn, FALLBACK_ANSWER};
