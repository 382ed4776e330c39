//! Demo host handler: echoes the received text back.

use async_trait::async_trait;
use dbot_core::{Handler, HandlerResponse, Message, MessageChain, Result};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if message.content.trim().is_empty() {
            return Ok(HandlerResponse::Ignore);
        }
        debug!(user = %message.user.display_name(), "Echoing message");
        Ok(HandlerResponse::Reply(MessageChain::text(
            message.content.clone(),
        )))
    }
}
