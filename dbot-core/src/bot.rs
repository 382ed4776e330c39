//! Outbound transport abstraction.
//!
//! [`Bot`] is transport-agnostic; dbot-telegram implements it on top of teloxide. Reply chains
//! produced by handlers are delivered with [`Bot::send_chain`].

use crate::error::Result;
use crate::types::{Chat, ImageSource, MessageChain, Segment};
use async_trait::async_trait;
use tracing::debug;

/// Sends text and images to a chat. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Sends a photo (local file or URL) to the given chat.
    async fn send_photo(&self, chat: &Chat, image: &ImageSource) -> Result<()>;

    /// Delivers a whole reply chain.
    ///
    /// Images are sent as they appear. Text is collected and sent once at the end, unless the
    /// chain is split, in which case each non-empty text segment is sent where it appears.
    async fn send_chain(&self, chat: &Chat, chain: &MessageChain) -> Result<()> {
        let mut text = String::new();
        for segment in chain.segments() {
            match segment {
                Segment::Plain(part) if chain.is_split() => {
                    if !part.is_empty() {
                        self.send_message(chat, part).await?;
                    }
                }
                Segment::Plain(part) => text.push_str(part),
                Segment::Image(source) => self.send_photo(chat, source).await?,
            }
        }
        if !text.is_empty() {
            self.send_message(chat, &text).await?;
        }
        debug!(
            chat_id = chat.id,
            segments = chain.segments().len(),
            split = chain.is_split(),
            "Reply chain delivered"
        );
        Ok(())
    }
}
