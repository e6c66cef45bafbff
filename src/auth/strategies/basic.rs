//! # 基础认证策略
//!
//! 用户名/密码校验，成功结果按凭据摘要缓存

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use tracing::debug;

use super::traits::{AuthStrategy, UserValidator};
use crate::auth::header_parser::AuthHeaderParser;
use crate::auth::types::{BasicCredential, CachedIdentity, Identity, IdentityCache, StrategyKind};
use crate::error::StrategyError;

/// 基础认证策略
pub struct CredentialStrategy {
    validator: Arc<dyn UserValidator>,
    cache: Option<Arc<IdentityCache>>,
}

impl CredentialStrategy {
    /// 创建不带缓存的策略
    pub fn new(validator: Arc<dyn UserValidator>) -> Self {
        Self {
            validator,
            cache: None,
        }
    }

    /// Memoize successful validations in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<IdentityCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Verify a username/password pair.
    ///
    /// A cached identity is returned without consulting the validator.
    /// Failures are never cached.
    pub async fn authenticate(
        &self,
        credential: &BasicCredential,
    ) -> Result<Identity, StrategyError> {
        let key = self.cache.as_ref().map(|_| credential.cache_key());

        if let (Some(cache), Some(key)) = (&self.cache, &key)
            && let Some(cached) = cache.get(key)
        {
            debug!(username = %credential.username, "basic credential served from cache");
            return Ok(cached.identity);
        }

        let identity = self
            .validator
            .validate(&credential.username, &credential.password)
            .await
            .map_err(|e| match e {
                StrategyError::NotApplicable => StrategyError::InvalidCredentials,
                other => other,
            })?;

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.put(key, CachedIdentity::new(identity.clone()));
        }
        Ok(identity)
    }
}

#[async_trait]
impl AuthStrategy for CredentialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Basic
    }

    async fn authenticate_request(&self, headers: &HeaderMap) -> Result<Identity, StrategyError> {
        let credential =
            AuthHeaderParser::basic_from_headers(headers).ok_or(StrategyError::NotApplicable)?;
        self.authenticate(&credential).await
    }
}
