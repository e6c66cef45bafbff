//! # 错误类型定义

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::auth::AuthError;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum GateError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        /// 错误信息
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 错误信息
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        /// 错误信息
        message: String,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 服务器启动错误
    #[error("服务器启动错误: {message}")]
    ServerStart {
        /// 错误信息
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl GateError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub const fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Auth(AuthError::Unauthenticated { .. }) => (StatusCode::UNAUTHORIZED, "AUTH_ERROR"),
            Self::Auth(AuthError::SigningFailure(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SIGNING_ERROR")
            }
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::ServerStart { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_START_ERROR"),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的服务器启动错误
    pub fn server_start_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerStart {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// 对外只暴露标准状态文本，内部细节只进日志
impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_http_response_parts();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for GateError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<bcrypt::BcryptError> for GateError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::config_with_source("密码处理失败", err)
    }
}
