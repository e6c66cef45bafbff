//! # HTTP 服务器
//!
//! 基于 axum 的受保护资源服务，启动时创建身份缓存清理任务，关闭时停止它

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppState, BookCatalog};

use std::net::{IpAddr, SocketAddr};

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::error::{GateError, Result};

/// 认证网关服务器
pub struct GateServer {
    addr: SocketAddr,
    auth: AuthService,
    sweep_interval: Option<std::time::Duration>,
    router: Router,
}

impl GateServer {
    /// 创建新的服务器
    pub fn new(config: &AppConfig, auth: AuthService, books: BookCatalog) -> Result<Self> {
        let ip = config.server.bind_address.parse::<IpAddr>().map_err(|e| {
            GateError::config_with_source(
                format!("invalid bind address '{}'", config.server.bind_address),
                e,
            )
        })?;

        let state = AppState::new(auth.clone(), books);
        let router = create_router(state, &config.cors)?;

        Ok(Self {
            addr: SocketAddr::new(ip, config.server.port),
            auth,
            sweep_interval: config.cache.sweep_interval(),
            router,
        })
    }

    /// 监听地址
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// 启动服务器，直到收到关闭信号
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            GateError::server_start_with_source(format!("failed to bind {}", self.addr), e)
        })?;
        let local_addr = listener.local_addr()?;

        let sweeper = self
            .sweep_interval
            .map(|period| self.auth.cache.spawn_sweeper(period));

        info!(addr = %local_addr, "auth gate listening");

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::internal_error!("server error: {}", e));

        if let Some(handle) = sweeper {
            handle.abort();
        }
        info!("auth gate stopped");
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
