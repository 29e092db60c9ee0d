//! OpenAI-compatible chat completions provider
//!
//! Works with OpenAI and any host exposing `/v1/chat/completions`. The
//! request is non-streaming; the single response is replayed as deltas so the
//! agent loop consumes every provider the same way.

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::types::{LlmRequest, LlmTool, StreamDelta, Usage};
use careeragent_core::{Message, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Base URL up to and including the version segment, e.g. `http://host/v1`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Convert the system prompt and history into OpenAI chat messages.
fn to_api_messages(system: Option<&str>, messages: &[Message]) -> Vec<ApiMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);

    if let Some(system) = system {
        out.push(ApiMessage {
            role: "system".into(),
            content: Some(system.to_string()),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for m in messages {
        let role = match m.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let tool_calls = if m.tool_calls.is_empty() {
            None
        } else {
            Some(
                m.tool_calls
                    .iter()
                    .map(|tc| ApiToolCall {
                        id: tc.id.clone(),
                        kind: "function".into(),
                        function: ApiFunction {
                            name: tc.name.clone(),
                            arguments: match &tc.arguments {
                                serde_json::Value::String(raw) => raw.clone(),
                                other => other.to_string(),
                            },
                        },
                    })
                    .collect(),
            )
        };
        out.push(ApiMessage {
            role: role.into(),
            // Assistant turns that only call tools carry null content.
            content: if m.content.is_empty() && tool_calls.is_some() {
                None
            } else {
                Some(m.content.clone())
            },
            tool_calls,
            tool_call_id: m.tool_call_id.clone(),
        });
    }

    out
}

fn to_api_tools(tools: &[LlmTool]) -> Vec<ApiToolDefinition> {
    tools
        .iter()
        .map(|t| ApiToolDefinition {
            kind: "function".into(),
            function: ApiToolFunction {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.input_schema.clone(),
            },
        })
        .collect()
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str { "openai" }

    fn models(&self) -> &[&str] {
        &["gpt-4o", "gpt-4.1", "gpt-5", "o3", "o4-mini"]
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ApiRequest {
            model: request.model.clone(),
            messages: to_api_messages(request.system.as_deref(), &request.messages),
            tools: if request.tools.is_empty() { None } else { Some(to_api_tools(&request.tools)) },
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!("OpenAI request: model={} messages={}", body.model, body.messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("OpenAI error {}: {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthFailed(error_text),
                429 => LlmError::RateLimited { retry_after_ms: 5000 },
                _ => LlmError::RequestFailed(format!("{}: {}", status, error_text)),
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        let usage = api_response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".into()))?;

        let mut deltas: Vec<LlmResult<StreamDelta>> = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            deltas.push(Ok(StreamDelta::Text(text)));
        }
        for tc in choice.message.tool_calls.unwrap_or_default() {
            deltas.push(Ok(StreamDelta::ToolCallStart { id: tc.id.clone(), name: tc.function.name }));
            deltas.push(Ok(StreamDelta::ToolCallDelta { id: tc.id.clone(), arguments: tc.function.arguments }));
            deltas.push(Ok(StreamDelta::ToolCallEnd { id: tc.id }));
        }
        deltas.push(Ok(StreamDelta::Done { stop_reason: choice.finish_reason, usage }));

        Ok(Box::pin(futures::stream::iter(deltas)))
    }
}

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ApiToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize, Debug)]
struct ApiMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: ApiFunction,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Serialize, Deserialize, Debug)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Serialize)]
struct ApiToolDefinition {
    #[serde(rename = "type")]
    kind: String,
    function: ApiToolFunction,
}

#[derive(Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
