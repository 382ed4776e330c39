//! `/start` command: replies with the configured greeting and ends the chain.

use async_trait::async_trait;
use dbot_core::{Handler, HandlerResponse, Message, MessageChain, Result};
use tracing::info;

/// True for `/start`, `/start@some_bot` and either followed by a deep-link payload.
pub fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    let name = command.split('@').next().unwrap_or("");
    name == "/start"
}

pub struct StartCommandHandler {
    start_message: String,
}

impl StartCommandHandler {
    pub fn new(start_message: impl Into<String>) -> Self {
        Self {
            start_message: start_message.into(),
        }
    }
}

#[async_trait]
impl Handler for StartCommandHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if !is_start_command(&message.content) {
            return Ok(HandlerResponse::Continue);
        }
        info!(chat_id = message.chat.id, "Replying to /start");
        Ok(HandlerResponse::Reply(MessageChain::text(
            self.start_message.clone(),
        )))
    }
}
