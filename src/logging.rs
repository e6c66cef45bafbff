//! # 日志配置模块
//!
//! 基于 `tracing-subscriber` 的日志初始化，`RUST_LOG` 优先于命令行级别

use std::env;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 默认过滤规则
#[must_use]
pub fn default_filter(log_level: Option<&str>) -> String {
    let level = log_level.unwrap_or("info");
    format!("{level},auth_gate=debug,tower_http=info")
}

/// 初始化日志系统
///
/// Safe to call more than once; later calls leave the installed subscriber in
/// place.
pub fn init_logging(log_level: Option<&str>) {
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(log_level));

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!(filter = %log_filter, "logging initialised");
    }
}
