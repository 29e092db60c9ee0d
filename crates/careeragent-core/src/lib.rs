//! Careeragent Core - Message model, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use types::*;
