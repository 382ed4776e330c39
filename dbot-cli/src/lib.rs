//! # dbot-cli
//!
//! Argument parsing, config loading and the demo [`EchoHandler`] the `dbot` binary runs with.

pub mod cli;
pub mod echo;

pub use cli::{load_config, Cli, Commands};
pub use dbot_telegram::TelegramConfig;
pub use echo::EchoHandler;
