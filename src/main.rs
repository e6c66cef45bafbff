//! # Auth Gate 主程序

use std::path::PathBuf;

use anyhow::Context;
use auth_gate::{
    auth::AuthService,
    config,
    logging,
    server::{BookCatalog, GateServer},
};
use clap::Parser;
use tracing::info;

/// HTTP authentication gate
#[derive(Debug, Parser)]
#[command(name = "auth-gate", version, about)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 监听端口，优先于配置文件和 PORT 环境变量
    #[arg(short, long)]
    port: Option<u16>,

    /// 日志级别（RUST_LOG 优先）
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    logging::init_logging(cli.log_level.as_deref());

    let mut app_config =
        config::load_config(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = cli.port {
        app_config.server.port = port;
    }

    let auth = AuthService::from_config(&app_config).context("failed to build authentication")?;
    info!(
        ttl_secs = app_config.cache.ttl_secs,
        users = app_config.users.len(),
        algorithm = ?app_config.auth.token.algorithm,
        "authentication engine ready"
    );

    let server = GateServer::new(&app_config, auth, BookCatalog::reference())
        .context("failed to build server")?;
    server.serve().await.context("server terminated with error")?;

    Ok(())
}
