//! 桥接运行：teloxide REPL 把每条文本消息推入限流队列；
//! drainer 将放行的消息交给 HandlerChain，回复再经 Bot 发回原会话。

use std::sync::Arc;

use anyhow::Result;
use dbot_core::{Bot as CoreBot, Handler, Message as CoreMessage, ToCoreMessage};
use dbot_ingest::{Envelope, ShardedIngest};
use handler_chain::HandlerChain;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::adapters::TelegramMessageWrapper;
use crate::bot_adapter::{build_teloxide_bot, TelegramBotAdapter};
use crate::config::TelegramConfig;
use crate::dispatch::ChainDispatcher;
use crate::start::StartCommandHandler;

/// `/start` handler first, then the host handler.
pub fn build_handler_chain(config: &TelegramConfig, handler: Arc<dyn Handler>) -> HandlerChain {
    HandlerChain::new()
        .add_handler(Arc::new(StartCommandHandler::new(
            config.start_message.clone(),
        )))
        .add_handler(handler)
}

/// Producer side: converts one update and pushes it. Returns false if nothing was enqueued
/// (non-text update or rejected envelope).
pub fn enqueue_message(ingest: &ShardedIngest<CoreMessage>, msg: &teloxide::types::Message) -> bool {
    let core_msg = TelegramMessageWrapper(msg).to_core();
    let Some(text) = msg.text() else {
        info!(
            user_id = core_msg.user.id,
            chat_id = core_msg.chat.id,
            "Received non-text message, skipped"
        );
        return false;
    };
    info!(
        user_id = core_msg.user.id,
        chat_id = core_msg.chat.id,
        message_content = %text,
        "Received message"
    );
    enqueue_core_message(ingest, core_msg)
}

/// Wraps an already converted message in an envelope keyed by its sender.
pub fn enqueue_core_message(ingest: &ShardedIngest<CoreMessage>, message: CoreMessage) -> bool {
    let chat_id = message.chat.id;
    match ingest.push(Envelope::new(message.sender_id(), message)) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, chat_id, "Message not enqueued");
            false
        }
    }
}

/// 运行桥接直到 Ctrl-C，调用前需已初始化日志。
///
/// 平台未启用时直接返回。退出时 drainer 先处理完手上的消息，队列中剩余的消息记录日志后丢弃。
#[instrument(skip(config, handler))]
pub async fn run_bridge(config: TelegramConfig, handler: Arc<dyn Handler>) -> Result<()> {
    config.validate()?;
    if !config.enabled {
        warn!("Telegram platform disabled (TELEGRAM_ENABLE is not true), not connecting");
        return Ok(());
    }

    let bot = build_teloxide_bot(&config);
    let reply_bot: Arc<dyn CoreBot> = Arc::new(TelegramBotAdapter::new(bot.clone()));
    let chain = build_handler_chain(&config, handler);
    let dispatcher =
        Arc::new(ChainDispatcher::new(chain, reply_bot).with_split(config.reply_split));

    let ingest = Arc::new(ShardedIngest::new(&config.ingest)?);
    let token = CancellationToken::new();
    let drainers = ingest.spawn(dispatcher, token.clone())?;

    info!(
        bot_token = %config.bot_token_masked(),
        window_secs = config.ingest.window.as_secs(),
        workers = config.ingest.workers,
        "Bridge started"
    );

    let producer = Arc::clone(&ingest);
    teloxide::repl(bot, move |_bot: Bot, msg: teloxide::types::Message| {
        let ingest = Arc::clone(&producer);
        async move {
            enqueue_message(&ingest, &msg);
            Ok(())
        }
    })
    .await;

    info!(queue_depth = ingest.depth(), "Shutting down, stopping drainers");
    token.cancel();
    let stats = drainers.await?;
    let dropped = ingest.drain_pending();
    if !dropped.is_empty() {
        warn!(count = dropped.len(), "Queued messages discarded at shutdown");
    }
    info!(
        admitted = stats.admitted,
        throttled = stats.throttled,
        failed = stats.failed,
        rejected = stats.rejected,
        "Bridge stopped"
    );
    Ok(())
}
