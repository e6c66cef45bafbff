//! Errors related to authentication strategies and token issuance.

use thiserror::Error;

/// Failure reported by a single authentication strategy.
///
/// These never reach the client directly: the union strategy folds them into
/// [`AuthError::Unauthenticated`] so the response does not reveal which check
/// failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    /// The request does not carry the credential shape this strategy needs.
    #[error("strategy not applicable to request")]
    NotApplicable,

    /// 用户名或密码错误
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Signature, claims or expiry check failed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// 令牌头部声明了未配置的算法
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl StrategyError {
    /// 便捷构造函数
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken(reason.into())
    }

    /// Whether this outcome counts as a failed attempt.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

/// Errors surfaced by the authentication engine to its callers.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Every applicable strategy failed, or none applied.
    #[error("request is not authenticated")]
    Unauthenticated {
        /// Last strategy failure, kept for diagnostics only.
        last: Option<StrategyError>,
    },

    /// Token signing failed; fatal to the request.
    #[error("token signing failed: {0}")]
    SigningFailure(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// 便捷构造函数
    #[must_use]
    pub const fn unauthenticated(last: Option<StrategyError>) -> Self {
        Self::Unauthenticated { last }
    }

    /// Underlying strategy failure, if any.
    #[must_use]
    pub const fn last_failure(&self) -> Option<&StrategyError> {
        match self {
            Self::Unauthenticated { last } => last.as_ref(),
            Self::SigningFailure(_) => None,
        }
    }
}
