//! Wraps teloxide::Bot and implements [`dbot_core::Bot`]. Production code sends messages via Telegram; tests can substitute another Bot impl.

use async_trait::async_trait;
use dbot_core::{Bot as CoreBot, Chat, DbotError, ImageSource, Result};
use teloxide::{prelude::*, types::ChatId, types::InputFile};
use tracing::error;

use crate::config::TelegramConfig;

/// Builds the teloxide client, pointing it at a custom Bot API server when configured.
pub fn build_teloxide_bot(config: &TelegramConfig) -> teloxide::Bot {
    let bot = teloxide::Bot::new(config.bot_token.clone());
    match config.telegram_api_url.as_deref() {
        Some(url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

/// Converts a core image source into a teloxide upload.
pub fn input_file(image: &ImageSource) -> Result<InputFile> {
    match image {
        ImageSource::Path(path) => Ok(InputFile::file(path.clone())),
        ImageSource::Url(url) => reqwest::Url::parse(url)
            .map(InputFile::url)
            .map_err(|e| DbotError::Bot(format!("Invalid image url {}: {}", url, e))),
    }
}

/// Thin wrapper around teloxide::Bot that implements dbot-core's Bot trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(|e| DbotError::Bot(e.to_string()))?;
        Ok(())
    }

    async fn send_photo(&self, chat: &Chat, image: &ImageSource) -> Result<()> {
        self.bot
            .send_photo(ChatId(chat.id), input_file(image)?)
            .await
            .map_err(|e| DbotError::Bot(e.to_string()))?;
        Ok(())
    }
}
