//! # dbot-telegram
//!
//! Telegram side of the bridge: teloxide adapters, [`dbot_core::Bot`] implementation, config,
//! the `/start` handler, and [`run_bridge`], which feeds updates through the rate-limited ingest
//! pipeline into the handler chain and sends replies back.

mod adapters;
mod bot_adapter;
mod config;
mod dispatch;
mod runner;
mod start;

pub use adapters::{chat_kind, TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::{build_teloxide_bot, input_file, TelegramBotAdapter};
pub use config::{TelegramConfig, DEFAULT_LOG_FILE, DEFAULT_START_MESSAGE};
pub use dispatch::ChainDispatcher;
pub use runner::{build_handler_chain, enqueue_core_message, enqueue_message, run_bridge};
pub use start::{is_start_command, StartCommandHandler};
