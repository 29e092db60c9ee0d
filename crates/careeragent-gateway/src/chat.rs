//! Terminal chat: one line per user turn, history kept for the session
//!
//! `/clear` forgets the history, `/quit` (or end of input) leaves. An
//! interrupt (Ctrl-C) while the agent is thinking abandons that turn only; at
//! the prompt it leaves.

use crate::server::RETRY_MESSAGE;
use careeragent_agent::{AgentError, CareerAgent};
use careeragent_core::Message;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A conversation with the agent. Only turns that got an answer enter the
/// history.
pub struct ChatSession {
    agent: Arc<CareerAgent>,
    history: Vec<Message>,
}

impl ChatSession {
    pub fn new(agent: Arc<CareerAgent>) -> Self {
        Self {
            agent,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub async fn send(&mut self, message: &str, cancel: CancellationToken) -> Result<String, AgentError> {
        let turn = self
            .agent
            .respond_cancellable(&self.history, message, cancel)
            .await?;
        self.history.push(Message::user(message));
        self.history.push(Message::assistant(&turn.answer));
        Ok(turn.answer)
    }
}

/// Forward every Ctrl-C the process receives. Listening starts now and lasts
/// until the receiver is dropped, so the signal never falls back to killing
/// the process mid-turn.
pub fn ctrl_c_interrupts() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Run the REPL until `/quit`, end of input or an interrupt at the prompt.
pub async fn run_chat<R, W>(
    agent: Arc<CareerAgent>,
    name: &str,
    input: R,
    mut output: W,
    mut interrupts: mpsc::UnboundedReceiver<()>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = ChatSession::new(agent);
    let mut lines = input.lines();

    output
        .write_all(format!("Chatting with {}. Type /quit to leave, /clear to start over.\n", name).as_bytes())
        .await?;

    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        let next = tokio::select! {
            line = lines.next_line() => line?,
            Some(()) = interrupts.recv() => {
                debug!("Interrupted at the prompt");
                output.write_all(b"\n").await?;
                break;
            }
        };
        let Some(line) = next else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                output.write_all(b"(history cleared)\n").await?;
                continue;
            }
            _ => {}
        }

        let cancel = CancellationToken::new();
        let turn = session.send(line, cancel.clone());
        tokio::pin!(turn);
        let result = tokio::select! {
            result = &mut turn => result,
            Some(()) = interrupts.recv() => {
                cancel.cancel();
                turn.await
            }
        };

        let text = match result {
            Ok(answer) => answer,
            Err(AgentError::Cancelled) => "(cancelled)".to_string(),
            Err(e) => {
                error!("Chat turn failed: {}", e);
                RETRY_MESSAGE.to_string()
            }
        };
        output.write_all(format!("\n{}\n\n", text).as_bytes()).await?;
    }

    info!("Chat ended after {} turns", session.history().len() / 2);
    output.flush().await?;
    Ok(())
}
