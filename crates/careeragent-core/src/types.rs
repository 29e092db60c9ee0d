//! Core types for Careeragent

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Message role
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Result of a tool call, linked to the assistant message that requested it.
    Tool,
}

/// A message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name on tool-result messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(Role::Assistant, content)
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// A user or assistant turn that carries only text.
    pub fn is_plain_turn(&self) -> bool {
        matches!(self.role, Role::User | Role::Assistant)
            && self.tool_calls.is_empty()
            && self.tool_call_id.is_none()
    }
}

/// A tool call requested by the assistant
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Argument payload. The model is asked for a JSON object; anything else
    /// fails validation in the tool registry.
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Build a call from the raw argument text a provider streamed. Text that
    /// is not valid JSON is kept as a string value so validation can report it.
    pub fn from_raw(id: impl Into<String>, name: impl Into<String>, raw_arguments: &str) -> Self {
        let arguments = if raw_arguments.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(raw_arguments)
                .unwrap_or_else(|_| serde_json::Value::String(raw_arguments.to_string()))
        };
        Self::new(id, name, arguments)
    }
}

/// Check that every tool-result message answers a call made by the most
/// recent assistant message. Tool results of one batch may follow each other.
pub fn check_tool_linkage(messages: &[Message]) -> Result<()> {
    let mut open_calls: Option<&[ToolCall]> = None;

    for (index, message) in messages.iter().enumerate() {
        match message.role {
            Role::Assistant => open_calls = Some(&message.tool_calls),
            Role::Tool => {
                let id = message
                    .tool_call_id
                    .as_deref()
                    .ok_or_else(|| Error::invalid_history(index, "tool result has no call id"))?;
                let calls = open_calls.ok_or_else(|| {
                    Error::invalid_history(index, "tool result does not follow an assistant message")
                })?;
                if !calls.iter().any(|c| c.id == id) {
                    return Err(Error::invalid_history(
                        index,
                        format!("tool result references unknown call id '{}'", id),
                    ));
                }
            }
            Role::System | Role::User => open_calls = None,
        }
    }

    Ok(())
}
