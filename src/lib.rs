//! # Auth Gate
//!
//! HTTP 认证网关：基础认证与 Bearer Token 组合认证、带过期的身份缓存、
//! 令牌签发，以及保护下游资源的 axum 中间件。

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AuthError, GateError, Result, StrategyError};
