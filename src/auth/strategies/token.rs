//! # Bearer Token认证策略
//!
//! 校验签名令牌，成功结果以原始令牌为键缓存。缓存条目同时受缓存 TTL
//! 和令牌 `exp` 约束

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use tracing::debug;

use super::traits::{AuthStrategy, TokenVerifier};
use crate::auth::header_parser::AuthHeaderParser;
use crate::auth::types::{CachedIdentity, Identity, IdentityCache, StrategyKind, redact};
use crate::error::StrategyError;

/// Bearer Token认证策略
pub struct TokenStrategy {
    verifier: Arc<dyn TokenVerifier>,
    cache: Option<Arc<IdentityCache>>,
}

impl TokenStrategy {
    /// 创建不带缓存的策略
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            cache: None,
        }
    }

    /// Memoize verified tokens in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<IdentityCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// 验证Bearer Token
    ///
    /// A cached entry is only reused while the token itself is unexpired.
    /// Past `exp` the entry is dropped and the token goes back through the
    /// verifier.
    pub fn authenticate(&self, token: &str) -> Result<Identity, StrategyError> {
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get(token)
        {
            if !cached.is_expired_at(Utc::now()) {
                debug!(token = %redact(token), "bearer token served from cache");
                return Ok(cached.identity);
            }
            cache.remove(token);
            debug!(token = %redact(token), "cached bearer token past exp");
        }

        let verified = self.verifier.verify(token).map_err(|e| match e {
            StrategyError::NotApplicable | StrategyError::InvalidCredentials => {
                StrategyError::invalid_token(e.to_string())
            }
            other => other,
        })?;

        let identity = verified.identity.clone();
        if let Some(cache) = &self.cache {
            cache.put(token.to_string(), CachedIdentity::from(verified));
        }
        Ok(identity)
    }
}

#[async_trait]
impl AuthStrategy for TokenStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Token
    }

    async fn authenticate_request(&self, headers: &HeaderMap) -> Result<Identity, StrategyError> {
        let token =
            AuthHeaderParser::bearer_from_headers(headers).ok_or(StrategyError::NotApplicable)?;
        self.authenticate(&token)
    }
}
