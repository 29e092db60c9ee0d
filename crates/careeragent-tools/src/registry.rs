//! Tool registry and trait definitions
//!
//! Each tool is a self-contained module implementing the Tool trait. The
//! registry is the only place a model-requested name is resolved to code.

use careeragent_core::{Message, ToolCall};
use careeragent_llm::LlmTool;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default cap on the characters of a single tool result.
pub const DEFAULT_MAX_RESULT_CHARS: usize = 50_000;

/// Why a tool call could not be carried out.
#[derive(Debug, thiserror::Error)]
pub enum ToolCallError {
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool {tool} failed unexpectedly: {reason}")]
    Panicked { tool: String, reason: String },
}

impl ToolCallError {
    pub fn invalid_arguments(tool: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments { tool: tool.to_string(), reason: reason.into() }
    }
}

/// What a tool hands back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolOutput {
    Text(String),
    Error(String),
}

impl ToolOutput {
    pub fn text(s: impl Into<String>) -> Self { Self::Text(s.into()) }
    pub fn error(s: impl Into<String>) -> Self { Self::Error(s.into()) }

    pub fn to_content_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Error(e) => format!("Error: {}", e),
        }
    }

    pub fn is_error(&self) -> bool { matches!(self, Self::Error(_)) }
}

/// Outcome of one executed tool call, ready to go back into the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    fn from_output(call: &ToolCall, output: &ToolOutput) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content: output.to_content_string(),
            is_error: output.is_error(),
        }
    }

    fn from_error(call: &ToolCall, err: &ToolCallError) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content: format!("Error: {}", err),
            is_error: true,
        }
    }

    pub fn into_message(self) -> Message {
        Message::tool_result(self.call_id, self.name, self.content)
    }
}

/// Deserialize tool arguments into a typed struct.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolCallError> {
    serde_json::from_value(args).map_err(|e| ToolCallError::invalid_arguments(tool, e.to_string()))
}

/// The Tool trait: implement this to add a new capability.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as the model calls it.
    fn name(&self) -> &str;

    /// Human-readable description sent to the LLM.
    fn description(&self) -> &str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> Value;

    /// Whether this tool only reads state (no side effects).
    fn is_read_only(&self) -> bool { false }

    /// Execute the tool. `args` is always a JSON object.
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolCallError>;

    /// Convert to the LLM tool definition format.
    fn to_llm_tool(&self) -> LlmTool {
        LlmTool {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    max_result_chars: usize,
}

impl Default for ToolRegistry {
    fn default() -> Self { Self::new() }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            max_result_chars: DEFAULT_MAX_RESULT_CHARS,
        }
    }

    pub fn with_max_result_chars(mut self, max: usize) -> Self {
        self.max_result_chars = max;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Resolve the tool for a call and check the arguments are an object.
    pub fn validate(&self, call: &ToolCall) -> Result<Arc<dyn Tool>, ToolCallError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolCallError::UnknownTool(call.name.clone()))?;
        if !call.arguments.is_object() {
            return Err(ToolCallError::invalid_arguments(
                &call.name,
                format!("expected a JSON object, got {}", json_kind(&call.arguments)),
            ));
        }
        Ok(tool)
    }

    /// Run one call. Never fails: unknown tools, bad arguments and panics all
    /// become error results the model can read.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let tool = match self.validate(call) {
            Ok(t) => t,
            Err(e) => {
                warn!("Rejected tool call {} ({}): {}", call.id, call.name, e);
                return ToolResult::from_error(call, &e);
            }
        };

        debug!("Executing tool {} ({})", call.name, call.id);
        let outcome = AssertUnwindSafe(tool.execute(call.arguments.clone()))
            .catch_unwind()
            .await;

        let mut result = match outcome {
            Ok(Ok(output)) => ToolResult::from_output(call, &output),
            Ok(Err(e)) => {
                warn!("Tool {} failed: {}", call.name, e);
                ToolResult::from_error(call, &e)
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                warn!("Tool {} panicked: {}", call.name, reason);
                ToolResult::from_error(call, &ToolCallError::Panicked { tool: call.name.clone(), reason })
            }
        };

        result.content = truncate(result.content, self.max_result_chars);
        result
    }

    /// LLM tool definitions for all tools, sorted by name.
    pub fn get_definitions(&self) -> Vec<LlmTool> {
        let mut defs: Vec<LlmTool> = self.tools.values().map(|t| t.to_llm_tool()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// List only read-only tools.
    pub fn list_read_only(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .tools
            .iter()
            .filter(|(_, t)| t.is_read_only())
            .map(|(k, _)| k.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Cut `content` to at most `max` characters, marking the cut.
fn truncate(content: String, max: usize) -> String {
    match content.char_indices().nth(max) {
        None => content,
        Some((idx, _)) => {
            let total = content.chars().count();
            format!("{}\n... [truncated {} of {} characters]", &content[..idx], total - max, total)
        }
    }
}
