//! # 认证策略特质
//!
//! 定义所有认证策略及其外部校验回调必须实现的接口

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::auth::types::{Identity, StrategyKind, VerifiedToken};
use crate::error::StrategyError;

/// 认证策略接口
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// 认证策略的类型
    fn kind(&self) -> StrategyKind;

    /// Authenticate from request headers.
    ///
    /// Returns [`StrategyError::NotApplicable`] when the headers do not carry
    /// this strategy's credential shape.
    async fn authenticate_request(&self, headers: &HeaderMap) -> Result<Identity, StrategyError>;
}

/// 外部用户名/密码校验回调
#[async_trait]
pub trait UserValidator: Send + Sync {
    /// 校验用户名和密码，成功时返回身份
    async fn validate(&self, username: &str, password: &str) -> Result<Identity, StrategyError>;
}

#[async_trait]
impl<F> UserValidator for F
where
    F: Fn(&str, &str) -> Result<Identity, StrategyError> + Send + Sync,
{
    async fn validate(&self, username: &str, password: &str) -> Result<Identity, StrategyError> {
        self(username, password)
    }
}

/// Full verification of a raw bearer token.
pub trait TokenVerifier: Send + Sync {
    /// Check signature, algorithm and claims. The returned `exp` bounds how
    /// long the result may be reused.
    fn verify(&self, token: &str) -> Result<VerifiedToken, StrategyError>;
}

impl<F> TokenVerifier for F
where
    F: Fn(&str) -> Result<VerifiedToken, StrategyError> + Send + Sync,
{
    fn verify(&self, token: &str) -> Result<VerifiedToken, StrategyError> {
        self(token)
    }
}
