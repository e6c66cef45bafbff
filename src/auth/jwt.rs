//! JWT token management
//!
//! Signing keys shared by the token issuer and the bearer token verifier.

use std::str::FromStr;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;

use crate::auth::strategies::TokenVerifier;
use crate::auth::types::{Identity, TokenClaims, VerifiedToken};
use crate::config::TokenConfig;
use crate::error::{AuthError, Result, StrategyError};

/// HMAC keys for one configured algorithm.
pub struct SigningKeys {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SigningKeys {
    /// Build keys for a symmetric algorithm. Anything outside the HMAC family
    /// is a configuration error.
    pub fn hmac(algorithm: Algorithm, secret: &[u8]) -> Result<Self> {
        crate::ensure_config!(
            matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512),
            "unsupported signing algorithm {:?}, expected HS256/HS384/HS512",
            algorithm
        );
        crate::ensure_config!(!secret.is_empty(), "JWT secret must not be empty");

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Configured signing algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

/// Mints signed, time-limited tokens for verified identities.
pub struct TokenIssuer {
    keys: Arc<SigningKeys>,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenIssuer {
    /// 创建令牌签发器
    pub fn new(keys: Arc<SigningKeys>, config: &TokenConfig) -> Result<Self> {
        let lifetime = Duration::from_std(config.lifetime())
            .map_err(|e| crate::error::GateError::config_with_source("token lifetime out of range", e))?;
        Ok(Self {
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            lifetime,
        })
    }

    /// Issue a token for `identity` expiring `lifetime` from now.
    pub fn issue(&self, identity: &Identity) -> std::result::Result<String, AuthError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue with an explicit issue time; `exp` is `now + lifetime`.
    pub fn issue_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, AuthError> {
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            sub: identity.username().to_string(),
            aud: self.audience.clone(),
            exp: (now + self.lifetime).timestamp(),
        };

        let header = Header::new(self.keys.algorithm);
        Ok(encode(&header, &claims, &self.keys.encoding_key)?)
    }

    /// 令牌有效期
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Verifies HMAC-signed tokens against the configured algorithm and key.
pub struct JwtVerifier {
    keys: Arc<SigningKeys>,
    validation: Validation,
}

impl JwtVerifier {
    /// 创建令牌校验器，零时钟偏差
    #[must_use]
    pub fn new(keys: Arc<SigningKeys>, config: &TokenConfig) -> Self {
        let mut validation = Validation::new(keys.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self { keys, validation }
    }

    // Reads `alg` straight from the header segment so that names the JWT
    // library cannot represent (e.g. "none") are still reported as
    // unsupported rather than malformed.
    fn check_algorithm(&self, token: &str) -> std::result::Result<(), StrategyError> {
        let segment = token
            .split('.')
            .next()
            .ok_or_else(|| StrategyError::invalid_token("missing header"))?;
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(segment.trim_end_matches('='))
            .map_err(|_| StrategyError::invalid_token("header is not base64url"))?;
        let header: RawHeader = serde_json::from_slice(&bytes)
            .map_err(|_| StrategyError::invalid_token("header is not valid JSON"))?;

        match Algorithm::from_str(&header.alg) {
            Ok(alg) if alg == self.keys.algorithm => Ok(()),
            _ => Err(StrategyError::UnsupportedAlgorithm(header.alg)),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> std::result::Result<VerifiedToken, StrategyError> {
        self.check_algorithm(token)?;

        let claims = decode::<TokenClaims>(token, &self.keys.decoding_key, &self.validation)
            .map_err(|e| StrategyError::invalid_token(format!("{:?}", e.kind())))?
            .claims;

        // Additional check: valid strictly before `exp`
        if claims.is_expired_at(Utc::now()) {
            return Err(StrategyError::invalid_token("ExpiredSignature"));
        }

        let identity =
            Identity::new(claims.sub).map_err(|e| StrategyError::invalid_token(e.to_string()))?;
        Ok(VerifiedToken::new(identity, claims.exp))
    }
}
