//! Downstream end of the ingest pipeline: runs the handler chain for an admitted message and
//! sends its reply back to the originating chat.

use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{Bot, HandlerResponse, Message};
use dbot_ingest::{EnvelopeHandler, HandlerFailure};
use handler_chain::HandlerChain;
use tracing::{info, instrument};

pub struct ChainDispatcher {
    chain: HandlerChain,
    bot: Arc<dyn Bot>,
    split_replies: bool,
}

impl ChainDispatcher {
    pub fn new(chain: HandlerChain, bot: Arc<dyn Bot>) -> Self {
        Self {
            chain,
            bot,
            split_replies: false,
        }
    }

    /// Forces every reply to be sent one text segment per message.
    pub fn with_split(mut self, split: bool) -> Self {
        self.split_replies = split;
        self
    }
}

#[async_trait]
impl EnvelopeHandler<Message> for ChainDispatcher {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = %message.id))]
    async fn handle(&self, message: Message) -> Result<(), HandlerFailure> {
        let response = self.chain.handle(&message).await?;
        if let HandlerResponse::Reply(reply) = response {
            let reply = if self.split_replies {
                reply.with_split(true)
            } else {
                reply
            };
            info!(
                segments = reply.segments().len(),
                reply_len = reply.plain_text().len(),
                "Sending reply"
            );
            self.bot.send_chain(&message.chat, &reply).await?;
        }
        Ok(())
    }
}
