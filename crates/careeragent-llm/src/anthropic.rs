//! Anthropic Claude API provider with SSE streaming

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::types::{ContentBlock, LlmContent, LlmMessage, LlmRequest, StreamDelta, Usage};
use careeragent_core::{Message, Role};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Convert conversation history into Anthropic messages. Consecutive tool
/// results collapse into one user message, as the API requires.
pub fn to_anthropic_messages(messages: &[Message]) -> Vec<LlmMessage> {
    let mut out: Vec<LlmMessage> = Vec::with_capacity(messages.len());

    for m in messages {
        match m.role {
            Role::System => continue,
            Role::User => out.push(LlmMessage {
                role: "user".into(),
                content: LlmContent::Text(m.content.clone()),
            }),
            Role::Assistant if m.tool_calls.is_empty() => out.push(LlmMessage {
                role: "assistant".into(),
                content: LlmContent::Text(m.content.clone()),
            }),
            Role::Assistant => {
                let mut blocks = Vec::with_capacity(m.tool_calls.len() + 1);
                if !m.content.is_empty() {
                    blocks.push(ContentBlock::Text { text: m.content.clone() });
                }
                blocks.extend(m.tool_calls.iter().map(|tc| ContentBlock::ToolUse {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    input: if tc.arguments.is_object() {
                        tc.arguments.clone()
                    } else {
                        serde_json::json!({})
                    },
                }));
                out.push(LlmMessage {
                    role: "assistant".into(),
                    content: LlmContent::Blocks(blocks),
                });
            }
            Role::Tool => {
                let block = ContentBlock::ToolResult {
                    tool_use_id: m.tool_call_id.clone().unwrap_or_default(),
                    content: m.content.clone(),
                    is_error: None,
                };
                match out.last_mut() {
                    Some(LlmMessage { role, content: LlmContent::Blocks(blocks) })
                        if role.as_str() == "user"
                            && blocks.iter().all(|b| matches!(b, ContentBlock::ToolResult { .. })) =>
                    {
                        blocks.push(block);
                    }
                    _ => out.push(LlmMessage {
                        role: "user".into(),
                        content: LlmContent::Blocks(vec![block]),
                    }),
                }
            }
        }
    }

    out
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str { "anthropic" }

    fn models(&self) -> &[&str] {
        &[
            "claude-sonnet-4",
            "claude-opus-4",
            "claude-haiku-4-5",
            "claude-3-5-haiku",
        ]
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        let body = AnthropicRequest {
            model: request.model.clone(),
            messages: to_anthropic_messages(&request.messages),
            max_tokens: request.max_tokens.unwrap_or(4096),
            stream: true,
            system: request.system.clone(),
            temperature: request.temperature,
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(request.tools.iter().map(|t| AnthropicTool {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    input_schema: t.input_schema.clone(),
                }).collect())
            },
        };

        debug!("Anthropic request: model={} messages={}", body.model, body.messages.len());

        let response = self.client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Anthropic error {}: {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthFailed(error_text),
                429 => LlmError::RateLimited { retry_after_ms: 60000 },
                _ => LlmError::RequestFailed(format!("{}: {}", status, error_text)),
            });
        }

        let stream = parse_sse_stream(response.bytes_stream());
        Ok(Box::pin(stream))
    }
}

pub(crate) fn parse_sse_stream<E: std::fmt::Display + Send + 'static>(
    bytes_stream: impl futures::Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
) -> impl futures::Stream<Item = LlmResult<StreamDelta>> + Send {
    async_stream::stream! {
        let mut buffer = String::new();
        let mut current_tool_id: Option<String> = None;
        let mut stop_reason: Option<String> = None;
        let mut usage: Option<Usage> = None;

        tokio::pin!(bytes_stream);

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(LlmError::StreamError(e.to_string()));
                    return;
                }
            };

            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(event_end) = buffer.find("\n\n") {
                let event_str = buffer[..event_end].to_string();
                buffer = buffer[event_end + 2..].to_string();

                let mut event_type = String::new();
                let mut event_data = String::new();

                for line in event_str.lines() {
                    if let Some(rest) = line.strip_prefix("event: ") {
                        event_type = rest.to_string();
                    } else if let Some(rest) = line.strip_prefix("data: ") {
                        event_data = rest.to_string();
                    }
                }

                if event_data.is_empty() { continue; }

                match event_type.as_str() {
                    "content_block_start" => {
                        if let Ok(data) = serde_json::from_str::<ContentBlockStart>(&event_data) {
                            match data.content_block {
                                ContentBlockType::ToolUse { id, name } => {
                                    current_tool_id = Some(id.clone());
                                    yield Ok(StreamDelta::ToolCallStart { id, name });
                                }
                                ContentBlockType::Text { .. } | ContentBlockType::Other => {}
                            }
                        }
                    }
                    "content_block_delta" => {
                        if let Ok(data) = serde_json::from_str::<ContentBlockDelta>(&event_data) {
                            match data.delta {
                                DeltaType::TextDelta { text } => {
                                    yield Ok(StreamDelta::Text(text));
                                }
                                DeltaType::InputJsonDelta { partial_json } => {
                                    if let Some(id) = &current_tool_id {
                                        yield Ok(StreamDelta::ToolCallDelta {
                                            id: id.clone(),
                                            arguments: partial_json,
                                        });
                                    }
                                }
                                DeltaType::Other => {}
                            }
                        }
                    }
                    "content_block_stop" => {
                        if let Some(id) = current_tool_id.take() {
                            yield Ok(StreamDelta::ToolCallEnd { id });
                        }
                    }
                    "message_delta" => {
                        if let Ok(data) = serde_json::from_str::<MessageDelta>(&event_data) {
                            if let Some(reason) = data.delta.stop_reason {
                                debug!("Message complete: stop_reason={}", reason);
                                stop_reason = Some(reason);
                            }
                            if data.usage.is_some() {
                                usage = data.usage;
                            }
                        }
                    }
                    "message_stop" => {
                        yield Ok(StreamDelta::Done {
                            stop_reason: stop_reason.take().or_else(|| Some("end_turn".to_string())),
                            usage: usage.take(),
                        });
                    }
                    "error" => {
                        if let Ok(data) = serde_json::from_str::<ErrorEvent>(&event_data) {
                            yield Err(LlmError::StreamError(data.error.message));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<LlmMessage>,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
}

#[derive(Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct ContentBlockStart {
    content_block: ContentBlockType,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockType {
    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String },
    #[serde(rename = "text")]
    #[allow(dead_code)]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ContentBlockDelta {
    delta: DeltaType,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum DeltaType {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(rename = "input_json_delta")]
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct MessageDelta {
    delta: MessageDeltaContent,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct MessageDeltaContent {
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEvent {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}
