//! HTTP surface: chat page, health document and the chat API

use crate::service::CareerService;
use careeragent_agent::{AgentError, CareerAgent};
use careeragent_core::{GatewayConfig, Message};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// What the user sees when the model could not produce an answer.
pub const RETRY_MESSAGE: &str = "Something went wrong, please retry.";

pub struct GatewayState {
    pub agent: Arc<CareerAgent>,
    pub profile_name: String,
    pub repositories: Vec<String>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(service: CareerService) -> Self {
        Self {
            agent: service.agent,
            profile_name: service.profile_name,
            repositories: service.repositories,
            started_at: Instant::now(),
        }
    }
}

/// One turn of chat history as a browser sends it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Map browser history to messages. Roles other than user and assistant are
/// dropped here; the agent sanitizes the rest.
fn to_messages(history: &[ChatTurn]) -> Vec<Message> {
    history
        .iter()
        .filter_map(|turn| match turn.role.as_str() {
            "user" => Some(Message::user(&turn.content)),
            "assistant" => Some(Message::assistant(&turn.content)),
            _ => None,
        })
        .collect()
}

// ============================================================
// Errors
// ============================================================

enum ApiError {
    EmptyMessage,
    Agent(AgentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retryable) = match self {
            ApiError::EmptyMessage => (StatusCode::BAD_REQUEST, "message must not be empty".to_string(), false),
            ApiError::Agent(e) => {
                error!("Chat turn failed: {}", e);
                let status = match &e {
                    AgentError::Upstream(_) => StatusCode::BAD_GATEWAY,
                    AgentError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    AgentError::Cancelled | AgentError::InvalidHistory(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, RETRY_MESSAGE.to_string(), e.is_retryable())
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": message, "retryable": retryable })),
        )
            .into_response()
    }
}

// ============================================================
// Router
// ============================================================

pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_gateway(config: &GatewayConfig, state: Arc<GatewayState>) -> anyhow::Result<()> {
    let bind_addr: SocketAddr = format!("{}:{}", config.bind.to_addr(), config.port).parse()?;

    info!("Careeragent Gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Profile:      {}", state.profile_name);
    info!("  Repositories: {}", state.repositories.len());

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============================================================
// Handlers
// ============================================================

async fn chat_handler(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::EmptyMessage);
    }
    let history = to_messages(&request.history);
    let reply = state
        .agent
        .respond(&history, &request.message)
        .await
        .map_err(ApiError::Agent)?;
    Ok(Json(ChatReply { reply }))
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let tools: Vec<String> = state
        .agent
        .tool_definitions()
        .into_iter()
        .map(|t| t.name)
        .collect();
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "profile": state.profile_name,
        "model": state.agent.config().model,
        "repositories": state.repositories.len(),
        "tools": tools,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

async fn index_handler(State(state): State<Arc<GatewayState>>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>Chat with {name}</title>
<style>
body {{ font-family: sans-serif; background: #1a1a2e; color: #eee; padding: 20px; max-width: 800px; margin: 0 auto; }}
h1 {{ color: #f39c12; }}
#log {{ background: #16213e; padding: 15px; border-radius: 8px; min-height: 300px; max-height: 60vh; overflow-y: auto; }}
.turn {{ margin: 8px 0; white-space: pre-wrap; }}
.user {{ color: #3498db; }} .assistant {{ color: #eee; }} .error {{ color: #e74c3c; }}
textarea {{ width: 100%; min-height: 60px; background: #0f3460; color: #eee; border: 1px solid #333; border-radius: 4px; padding: 10px; font-size: 14px; resize: vertical; box-sizing: border-box; }}
button {{ background: #f39c12; border: none; padding: 8px 16px; border-radius: 4px; cursor: pointer; font-size: 14px; margin: 5px 5px 5px 0; }}
button:hover {{ background: #e67e22; }} button:disabled {{ background: #555; }}
</style></head><body>
<h1>Chat with {name}</h1>
<div id="log"><div class="turn assistant">Hi, I'm {name}'s agent. Ask me anything!</div></div>
<textarea id="msg" placeholder="Ask about {name}'s career..."></textarea>
<button id="send" onclick="send()">Send</button>
<button onclick="turns.length=0;document.getElementById('log').innerHTML=greeting">Clear</button>
<script>
const turns = [];
const greeting = document.getElementById('log').innerHTML;
function show(cls, text) {{
    const log = document.getElementById('log');
    const div = document.createElement('div');
    div.className = 'turn ' + cls;
    div.textContent = text;
    log.appendChild(div);
    log.scrollTop = log.scrollHeight;
}}
async function send() {{
    const box = document.getElementById('msg');
    const message = box.value;
    if (!message.trim()) return;
    const button = document.getElementById('send');
    button.disabled = true;
    show('user', message);
    box.value = '';
    try {{
        const resp = await fetch('/api/chat', {{
            method: 'POST',
            headers: {{ 'Content-Type': 'application/json' }},
            body: JSON.stringify({{ history: turns, message: message }}),
        }});
        const data = await resp.json();
        if (resp.ok) {{
            turns.push({{ role: 'user', content: message }});
            turns.push({{ role: 'assistant', content: data.reply }});
            show('assistant', data.reply);
        }} else {{
            show('error', data.error || 'Something went wrong, please retry.');
        }}
    }} catch (e) {{
        show('error', 'Something went wrong, please retry.');
    }}
    button.disabled = false;
}}
document.getElementById('msg').addEventListener('keydown', (e) => {{
    if (e.key === 'Enter' && !e.shiftKey) {{ e.preventDefault(); send(); }}
}});
</script></body></html>"#,
        name = html_escape(&state.profile_name),
    ))
}
