//! Careeragent Gateway - HTTP chat API, web page and terminal chat

pub mod chat;
pub mod server;
pub mod service;

pub use chat::{ctrl_c_interrupts, run_chat, ChatSession};
pub use server::{build_router, start_gateway, ChatReply, ChatRequest, ChatTurn, GatewayState, RETRY_MESSAGE};
pub use service::{assemble_agent, build_agent, build_provider, check_health, load_config, CareerService};
