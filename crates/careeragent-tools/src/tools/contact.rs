//! Contact tools: forward unanswered questions and visitor details to the
//! profile owner

use crate::registry::{parse_args, Tool, ToolCallError, ToolOutput};
use careeragent_notify::Notifier;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

const ACK: &str = "ok";

/// Send a notification; a failed send is logged and otherwise ignored.
async fn push(notifier: &dyn Notifier, message: &str) {
    match notifier.notify(message).await {
        Ok(()) => info!("Notified via {}: {}", notifier.name(), message),
        Err(e) => warn!("Notification via {} failed: {}", notifier.name(), e),
    }
}

pub struct RecordUnknownQuestionTool {
    notifier: Arc<dyn Notifier>,
}

impl RecordUnknownQuestionTool {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[derive(Deserialize)]
struct QuestionArgs {
    question: String,
}

#[async_trait::async_trait]
impl Tool for RecordUnknownQuestionTool {
    fn name(&self) -> &str { "record_unknown_question" }

    fn description(&self) -> &str {
        "Always use this tool to record any question that couldn't be answered \
         as you didn't know the answer"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question that couldn't be answered"
                }
            },
            "required": ["question"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolCallError> {
        let args: QuestionArgs = parse_args(self.name(), args)?;
        push(self.notifier.as_ref(), &format!("Recording {}", args.question)).await;
        Ok(ToolOutput::text(ACK))
    }
}

pub struct RecordUserDetailsTool {
    notifier: Arc<dyn Notifier>,
}

impl RecordUserDetailsTool {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[derive(Deserialize)]
struct DetailsArgs {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[async_trait::async_trait]
impl Tool for RecordUserDetailsTool {
    fn name(&self) -> &str { "record_user_details" }

    fn description(&self) -> &str {
        "Use this tool to record that a user is interested in being in touch \
         and provided an email address"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "description": "The email address of this user"
                },
                "name": {
                    "type": "string",
                    "description": "The user's name, if they provided it"
                },
                "notes": {
                    "type": "string",
                    "description": "Any additional information about the conversation that's worth recording to give context"
                }
            },
            "required": ["email"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolCallError> {
        let args: DetailsArgs = parse_args(self.name(), args)?;
        let email = args.email.trim();
        if email.is_empty() {
            return Err(ToolCallError::invalid_arguments(self.name(), "email must not be empty"));
        }
        let name = or_default(args.name, "Name not provided");
        let notes = or_default(args.notes, "not provided");

        push(
            self.notifier.as_ref(),
            &format!("Recording {} with email {} and notes {}", name, email, notes),
        )
        .await;
        Ok(ToolOutput::text(ACK))
    }
}
