//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dbot_telegram::TelegramConfig;

#[derive(Parser)]
#[command(name = "dbot")]
#[command(about = "Rate-limited Telegram bridge", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bridge (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Load and validate the config, print it with the token masked, then exit.
    CheckConfig {
        #[arg(short, long)]
        token: Option<String>,
    },
}

/// Load TelegramConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<TelegramConfig> {
    TelegramConfig::from_env(token)
}
