//! Core types: user, chat, message, reply chain, handler response, and the Handler trait.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity (id, username, names). `id == 0` means the transport did not report a sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Display name: username, then first + last name, then the numeric id.
    pub fn display_name(&self) -> String {
        if let Some(username) = &self.username {
            return username.clone();
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.id.to_string(),
        }
    }
}

/// Whether a conversation is one-to-one with the bot or a group/channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Private,
    Group,
}

/// Chat (private, group or channel) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub kind: MessageKind,
}

/// A single inbound message, already translated out of the transport's types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    /// Conversation key used by the host framework; the chat id for Telegram.
    pub session_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Stable identifier of the originating party: the user id, or the chat id when the
    /// transport reported no user (e.g. channel posts).
    pub fn sender_id(&self) -> String {
        if self.user.id != 0 {
            self.user.id.to_string()
        } else {
            self.chat.id.to_string()
        }
    }
}

/// Where an outbound image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// Local file uploaded by the transport.
    Path(PathBuf),
    /// Remote URL the transport fetches itself.
    Url(String),
}

/// One piece of an outbound reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Plain(String),
    Image(ImageSource),
}

/// Ordered reply made of text and image segments.
///
/// By default all text segments are joined into one message sent after the images.
/// With `split` set, every text segment goes out as its own message in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageChain {
    segments: Vec<Segment>,
    split: bool,
}

impl MessageChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with a single text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new().plain(text)
    }

    pub fn plain(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Plain(text.into()));
        self
    }

    pub fn image(mut self, source: ImageSource) -> Self {
        self.segments.push(Segment::Image(source));
        self
    }

    pub fn with_split(mut self, split: bool) -> Self {
        self.split = split;
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_split(&self) -> bool {
        self.split
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All text segments concatenated in order.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Plain(text) => Some(text.as_str()),
                Segment::Image(_) => None,
            })
            .collect()
    }
}

/// Handler result for the chain. `Reply(chain)` carries the response so later handlers can see it in `after()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; no response body.
    Stop,
    /// Skip this handler, try next.
    Ignore,
    /// Stop the chain and send this reply back to the chat.
    Reply(MessageChain),
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

/// Single handler concept: optional before / handle / after. Chain runs all before → handle until Stop/Reply → all after (reverse).
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _message: &Message) -> crate::error::Result<bool> {
        Ok(true)
    }
    /// Processes the message. Return Stop or Reply to end the handle phase. Default: Continue.
    async fn handle(&self, _message: &Message) -> crate::error::Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }
    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(
        &self,
        _message: &Message,
        _response: &HandlerResponse,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}
