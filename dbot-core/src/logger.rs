//! 日志初始化：同一个 fmt layer（级别、target、线程、span 关闭事件）写到 stdout，
//! 传入路径时同时追加写入日志文件。

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::FmtSpan, fmt::writer::MakeWriterExt, layer::SubscriberExt,
    util::SubscriberInitExt, EnvFilter, Registry,
};

/// 安装全局 tracing 订阅者。
///
/// 日志级别取自 RUST_LOG，未设置时为 info；需先加载 .env（dotenvy::dotenv()）才会生效。
/// 日志文件的父目录不存在时自动创建。已设置过订阅者时返回错误。
pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    let registry = Registry::default().with(env_filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            registry
                .with(fmt_layer.with_writer(io::stdout.and(file)))
                .try_init()
        }
        None => registry.with(fmt_layer.with_writer(io::stdout)).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
