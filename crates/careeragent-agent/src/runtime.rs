//! Conversation loop: model call, tool execution, repeat until the model
//! answers in plain text or the round cap is hit

use crate::error::AgentError;
use careeragent_core::{check_tool_linkage, AppConfig, Message, ToolCall};
use careeragent_llm::{AccumulatedToolCall, LlmError, LlmProvider, LlmRequest, LlmTool, StreamDelta};
use careeragent_tools::ToolRegistry;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Returned when the model keeps calling tools past the round cap.
pub const FALLBACK_ANSWER: &str =
    "I'm sorry, I wasn't able to complete that request. Please try rephrasing your question.";

pub struct AgentConfig {
    pub model: String,
    /// Model invocations allowed per user turn.
    pub max_rounds: usize,
    pub model_timeout: Duration,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_rounds: 10,
            model_timeout: Duration::from_secs(60),
            max_tokens: Some(4096),
            temperature: None,
        }
    }
}

impl AgentConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model().to_string(),
            max_rounds: config.agent.max_rounds,
            model_timeout: config.agent.model_timeout(),
            max_tokens: Some(config.llm.max_tokens),
            temperature: config.llm.temperature,
        }
    }
}

/// How a turn ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The model answered in plain text.
    Answered,
    /// The round cap was reached and the fallback answer returned.
    RoundLimit,
}

/// Everything that happened while answering one user turn.
#[derive(Clone, Debug)]
pub struct Turn {
    pub answer: String,
    /// Sanitized history, the user turn, and every message produced after it.
    pub transcript: Vec<Message>,
    /// Model invocations made.
    pub rounds: usize,
    pub outcome: Outcome,
}

/// Keep only text turns from the user and the assistant, as a chat surface
/// shows them. Tool traffic and system messages from callers are dropped.
pub fn sanitize_history(history: &[Message]) -> Vec<Message> {
    history
        .iter()
        .filter(|m| m.is_plain_turn() && !m.content.trim().is_empty())
        .map(|m| Message { name: None, ..m.clone() })
        .collect()
}

/// Assistant message assembled from one streamed model response.
struct ModelReply {
    text: String,
    tool_calls: Vec<ToolCall>,
    stop_reason: Option<String>,
}

pub struct CareerAgent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    config: AgentConfig,
}

impl CareerAgent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools: Arc::new(tools),
            system_prompt: system_prompt.into(),
            config,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub fn tool_definitions(&self) -> Vec<LlmTool> {
        self.tools.get_definitions()
    }

    /// Answer one user turn given the prior chat history.
    pub async fn respond(&self, history: &[Message], user_turn: &str) -> Result<String, AgentError> {
        Ok(self.respond_detailed(history, user_turn).await?.answer)
    }

    /// Like [`respond`](Self::respond) but also returns the transcript.
    pub async fn respond_detailed(&self, history: &[Message], user_turn: &str) -> Result<Turn, AgentError> {
        self.respond_cancellable(history, user_turn, CancellationToken::new()).await
    }

    /// Run a turn that stops with [`AgentError::Cancelled`] once `cancel`
    /// fires. An in-flight model request is dropped; a running tool call is
    /// allowed to finish.
    pub async fn respond_cancellable(
        &self,
        history: &[Message],
        user_turn: &str,
        cancel: CancellationToken,
    ) -> Result<Turn, AgentError> {
        let mut transcript = sanitize_history(history);
        transcript.push(Message::user(user_turn));
        let tools = self.tools.get_definitions();

        for round in 1..=self.config.max_rounds {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            check_tool_linkage(&transcript)?;

            let request = LlmRequest {
                model: self.config.model.clone(),
                messages: transcript.clone(),
                tools: tools.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                system: Some(self.system_prompt.clone()),
            };

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Model call cancelled in round {}", round);
                    return Err(AgentError::Cancelled);
                }
                result = tokio::time::timeout(self.config.model_timeout, self.call_model(request)) => {
                    result.map_err(|_| AgentError::Timeout { secs: self.config.model_timeout.as_secs() })??
                }
            };

            if reply.tool_calls.is_empty() {
                debug!("Round {} answered (stop_reason={:?})", round, reply.stop_reason);
                transcript.push(Message::assistant(reply.text.clone()));
                info!("Turn complete: rounds={}, messages={}", round, transcript.len());
                return Ok(Turn {
                    answer: reply.text,
                    transcript,
                    rounds: round,
                    outcome: Outcome::Answered,
                });
            }

            debug!("Round {}: {} tool call(s)", round, reply.tool_calls.len());
            let calls = reply.tool_calls.clone();
            transcript.push(Message::assistant_with_tools(reply.text, reply.tool_calls));

            for call in &calls {
                let result = self.tools.execute(call).await;
                debug!("Tool {} ({}) -> {} chars, error={}", call.name, call.id, result.content.len(), result.is_error);
                transcript.push(result.into_message());
            }
        }

        warn!("Round cap of {} reached without a final answer", self.config.max_rounds);
        transcript.push(Message::assistant(FALLBACK_ANSWER));
        Ok(Turn {
            answer: FALLBACK_ANSWER.to_string(),
            transcript,
            rounds: self.config.max_rounds,
            outcome: Outcome::RoundLimit,
        })
    }

    /// Send one request and accumulate the streamed assistant message.
    async fn call_model(&self, request: LlmRequest) -> Result<ModelReply, AgentError> {
        let stream = self.provider.complete_stream(request).await?;
        tokio::pin!(stream);

        let mut text = String::new();
        let mut finished: Vec<AccumulatedToolCall> = Vec::new();
        let mut current: Option<AccumulatedToolCall> = None;
        let mut stop_reason = None;

        while let Some(delta) = stream.next().await {
            match delta? {
                StreamDelta::Text(t) => text.push_str(&t),
                StreamDelta::ToolCallStart { id, name } => {
                    if let Some(open) = current.take() {
                        finished.push(open);
                    }
                    current = Some(AccumulatedToolCall { id, name, arguments: String::new() });
                }
                StreamDelta::ToolCallDelta { arguments, .. } => {
                    if let Some(ref mut tool) = current {
                        tool.arguments.push_str(&arguments);
                    }
                }
                StreamDelta::ToolCallEnd { .. } => {
                    if let Some(tool) = current.take() {
                        finished.push(tool);
                    }
                }
                StreamDelta::Done { stop_reason: sr, .. } => stop_reason = sr,
                StreamDelta::Error(e) => return Err(LlmError::StreamError(e).into()),
            }
        }
        if let Some(open) = current.take() {
            finished.push(open);
        }

        let tool_calls = finished
            .into_iter()
            .map(|mut tc| {
                if tc.id.is_empty() {
                    tc.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                }
                tc.into_tool_call()
            })
            .collect();

        Ok(ModelReply { text, tool_calls, stop_reason })
    }
}
