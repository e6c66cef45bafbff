//! # 组合认证策略
//!
//! 按固定优先级依次尝试各策略，第一个成功者胜出

use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::debug;

use super::traits::AuthStrategy;
use crate::auth::types::Identity;
use crate::error::{AuthError, StrategyError};

/// Ordered composition of strategies with first-success semantics.
#[derive(Clone)]
pub struct UnionStrategy {
    strategies: Vec<Arc<dyn AuthStrategy>>,
}

impl UnionStrategy {
    /// Strategies are tried in the order given.
    pub fn new(strategies: Vec<Arc<dyn AuthStrategy>>) -> Self {
        Self { strategies }
    }

    /// 策略数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// 是否没有任何策略
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Authenticate a request from its headers.
    ///
    /// Strategies whose credential shape is missing are skipped. When nothing
    /// succeeds the result is [`AuthError::Unauthenticated`] carrying the last
    /// real failure.
    pub async fn authenticate_request(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let mut last: Option<StrategyError> = None;

        for strategy in &self.strategies {
            match strategy.authenticate_request(headers).await {
                Ok(identity) => {
                    debug!(strategy = %strategy.kind(), username = identity.username(), "strategy succeeded");
                    return Ok(identity);
                }
                Err(e) if !e.is_failure() => {}
                Err(e) => {
                    debug!(strategy = %strategy.kind(), error = %e, "strategy failed");
                    last = Some(e);
                }
            }
        }

        Err(AuthError::unauthenticated(last))
    }
}
