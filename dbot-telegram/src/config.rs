//! 桥接配置：从环境变量加载（先调用 dotenvy::dotenv() 读取 .env）。
//! BOT_TOKEN 必填，其余均有默认值；限流相关的四项落到 [`IngestConfig`]。

use anyhow::{Context, Result};
use dbot_ingest::IngestConfig;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_START_MESSAGE: &str = "I'm dbot, please talk to me!";
pub const DEFAULT_LOG_FILE: &str = "logs/dbot.log";

/// Telegram connection, reply behaviour, logging and ingest tuning.
#[derive(Clone)]
pub struct TelegramConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_ENABLE; when false the runner does not connect.
    pub enabled: bool,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// START_MESSAGE, sent in reply to /start
    pub start_message: String,
    /// REPLY_SPLIT: send every text segment of a reply as its own message
    pub reply_split: bool,
    /// LOG_FILE
    pub log_file: PathBuf,
    /// RATE_LIMIT_WINDOW_SECS, QUEUE_RETRY_PAUSE_MS, CLOCK_IDLE_MULTIPLIER, INGEST_WORKERS
    pub ingest: IngestConfig,
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        _ => Ok(default),
    }
}

impl TelegramConfig {
    /// Loads from the environment. `token` overrides BOT_TOKEN if provided.
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let start_message =
            env::var("START_MESSAGE").unwrap_or_else(|_| DEFAULT_START_MESSAGE.to_string());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());

        let defaults = IngestConfig::default();
        let ingest = IngestConfig::new()
            .with_window(Duration::from_secs(env_or(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.window.as_secs(),
            )?))
            .with_retry_pause(Duration::from_millis(env_or(
                "QUEUE_RETRY_PAUSE_MS",
                defaults.retry_pause.as_millis() as u64,
            )?))
            .with_clock_idle_multiplier(env_or(
                "CLOCK_IDLE_MULTIPLIER",
                defaults.clock_idle_multiplier,
            )?)
            .with_workers(env_or("INGEST_WORKERS", defaults.workers)?);

        Ok(Self {
            bot_token,
            enabled: env_or("TELEGRAM_ENABLE", false)?,
            telegram_api_url,
            start_message,
            reply_split: env_or("REPLY_SPLIT", false)?,
            log_file: PathBuf::from(log_file),
            ingest,
        })
    }

    /// Builds with the given token and every other value at its default.
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            enabled: false,
            telegram_api_url: None,
            start_message: DEFAULT_START_MESSAGE.to_string(),
            reply_split: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            ingest: IngestConfig::default(),
        }
    }

    /// Checks the token, the API URL and the ingest settings.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        self.ingest.validate()?;
        Ok(())
    }

    /// Token with everything but the first and last four characters hidden.
    pub fn bot_token_masked(&self) -> String {
        let token = &self.bot_token;
        if token.len() > 8 && token.is_char_boundary(4) && token.is_char_boundary(token.len() - 4) {
            format!("{}...{}", &token[..4], &token[token.len() - 4..])
        } else {
            "****".to_string()
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token_masked())
            .field("enabled", &self.enabled)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("start_message", &self.start_message)
            .field("reply_split", &self.reply_split)
            .field("log_file", &self.log_file)
            .field("ingest", &self.ingest)
            .finish()
    }
}
