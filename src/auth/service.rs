//! Authentication service
//!
//! Wires the shared identity cache, the strategies and the token issuer from
//! configuration.

use std::sync::Arc;

use tracing::debug;

use crate::auth::jwt::{JwtVerifier, SigningKeys, TokenIssuer};
use crate::auth::strategies::{
    AuthStrategy, CredentialStrategy, TokenStrategy, TokenVerifier, UnionStrategy, UserValidator,
};
use crate::auth::types::{IdentityCache, redact};
use crate::auth::validator::StaticUserValidator;
use crate::config::AppConfig;
use crate::error::Result;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    /// 组合认证策略（Token 优先，其次基础认证）
    pub union: Arc<UnionStrategy>,
    /// 令牌签发器
    pub issuer: Arc<TokenIssuer>,
    /// Identity cache shared by both strategies.
    pub cache: Arc<IdentityCache>,
}

impl AuthService {
    /// Build the engine from configuration with the static user table.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let validator =
            StaticUserValidator::from_config(&config.users, config.auth.bcrypt_cost)?;
        Self::with_validator(config, Arc::new(validator))
    }

    /// Build the engine with a caller-supplied credential validator.
    pub fn with_validator(config: &AppConfig, validator: Arc<dyn UserValidator>) -> Result<Self> {
        let token_config = &config.auth.token;
        let keys = Arc::new(SigningKeys::hmac(
            token_config.algorithm,
            token_config.secret.as_bytes(),
        )?);
        let verifier: Arc<dyn TokenVerifier> =
            Arc::new(JwtVerifier::new(Arc::clone(&keys), token_config));
        let issuer = Arc::new(TokenIssuer::new(keys, token_config)?);

        Ok(Self::assemble(config, verifier, validator, issuer))
    }

    /// Assemble from explicit parts. Token first, then basic.
    pub fn assemble(
        config: &AppConfig,
        verifier: Arc<dyn TokenVerifier>,
        validator: Arc<dyn UserValidator>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        let cache = Arc::new(build_identity_cache(config));

        let token = TokenStrategy::new(verifier).with_cache(Arc::clone(&cache));
        let basic = CredentialStrategy::new(validator).with_cache(Arc::clone(&cache));
        let strategies: Vec<Arc<dyn AuthStrategy>> = vec![Arc::new(token), Arc::new(basic)];

        Self {
            union: Arc::new(UnionStrategy::new(strategies)),
            issuer,
            cache,
        }
    }
}

fn build_identity_cache(config: &AppConfig) -> IdentityCache {
    IdentityCache::builder(config.cache.ttl())
        .max_entries(config.cache.max_entries)
        .on_expired(|key: &String, cached| {
            debug!(
                key = %redact(key),
                username = cached.identity.username(),
                "cached identity expired"
            );
        })
        .build()
}
