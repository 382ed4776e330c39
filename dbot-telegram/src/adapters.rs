//! Inbound conversion: teloxide users, chats and messages into the transport-agnostic
//! dbot_core types the handler chain works on.

use dbot_core::{Chat, Message, MessageKind, ToCoreMessage, ToCoreUser, User};

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

/// Maps a Telegram chat to the core kind: private chats are one-to-one, everything else is a group.
pub fn chat_kind(chat: &teloxide::types::Chat) -> MessageKind {
    if chat.is_private() {
        MessageKind::Private
    } else {
        MessageKind::Group
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`]. Only the text is carried over.
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreMessage for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Message {
        let chat_id = self.0.chat.id.0;
        Message {
            id: self.0.id.to_string(),
            user: self
                .0
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or_else(|| User {
                    id: 0,
                    username: None,
                    first_name: None,
                    last_name: None,
                }),
            chat: Chat {
                id: chat_id,
                kind: chat_kind(&self.0.chat),
            },
            session_id: chat_id.to_string(),
            content: self.0.text().unwrap_or("").to_string(),
            created_at: chrono::Utc::now(),
        }
    }
}
