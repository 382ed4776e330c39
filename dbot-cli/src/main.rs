//! dbot CLI: run the Telegram bridge with the echo handler, or check the config.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dbot_cli::{load_config, Cli, Commands, EchoHandler};
use dbot_core::init_tracing;
use dbot_telegram::run_bridge;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            init_tracing(Some(&config.log_file))?;
            tracing::info!(config = ?config, "Config loaded");
            run_bridge(config, Arc::new(EchoHandler)).await
        }
        Commands::CheckConfig { token } => {
            let config = load_config(token)?;
            config.validate()?;
            println!("{:#?}", config);
            Ok(())
        }
    }
}
