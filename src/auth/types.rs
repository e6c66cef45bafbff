//! # 认证类型定义
//!
//! 定义认证相关的数据结构

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cache::ExpiringCache;

/// Shared cache of verified identities, keyed by credential key or raw token.
pub type IdentityCache = ExpiringCache<String, CachedIdentity>;

/// Returned when an identity would be built with an empty username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("username must not be empty")]
pub struct EmptyUsername;

/// 已认证的身份
///
/// Immutable once built: the `with_*` methods consume and return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    extensions: BTreeMap<String, Vec<String>>,
}

impl Identity {
    /// 创建身份，用户名不能为空
    pub fn new(username: impl Into<String>) -> Result<Self, EmptyUsername> {
        let username = username.into();
        if username.is_empty() {
            return Err(EmptyUsername);
        }
        Ok(Self {
            username,
            id: None,
            groups: Vec::new(),
            extensions: BTreeMap::new(),
        })
    }

    /// 设置用户 ID
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 设置用户组
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a named list of extension values.
    #[must_use]
    pub fn with_extension<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// 用户名
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// 用户 ID
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// 用户组
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// 所有扩展属性
    #[must_use]
    pub const fn extensions(&self) -> &BTreeMap<String, Vec<String>> {
        &self.extensions
    }

    /// Values of one extension, if present.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&[String]> {
        self.extensions.get(name).map(Vec::as_slice)
    }
}

/// 基础认证凭据
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredential {
    /// 用户名
    pub username: String,
    /// 密码（明文，仅在内存中）
    pub password: String,
}

impl BasicCredential {
    /// 创建凭据
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Cache key for this pair. The password only enters as part of a digest.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.username.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.password.as_bytes());
        format!("basic:{}", hex::encode(hasher.finalize()))
    }
}

// 密码不进日志
impl fmt::Debug for BasicCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Which strategy produced (or failed) an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Bearer token
    Token,
    /// 基础认证
    Basic,
}

impl StrategyKind {
    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Basic => "basic",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT 载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// 签发者
    pub iss: String,
    /// 用户名
    pub sub: String,
    /// 受众
    pub aud: String,
    /// 过期时间（Unix 秒）
    pub exp: i64,
}

impl TokenClaims {
    /// Whether the token is expired at `now`. A token is only valid strictly
    /// before `exp`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// 令牌校验结果：身份及其过期时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// 令牌所属身份
    pub identity: Identity,
    /// 过期时间（Unix 秒）
    pub expires_at: i64,
}

impl VerifiedToken {
    /// Pair an identity with the token's `exp`.
    #[must_use]
    pub const fn new(identity: Identity, expires_at: i64) -> Self {
        Self {
            identity,
            expires_at,
        }
    }
}

/// 缓存中的身份
///
/// Token entries carry the token's `exp`, which bounds the entry on top of
/// the cache TTL. Basic credential entries have no such bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedIdentity {
    /// 已认证的身份
    pub identity: Identity,
    /// 凭据自身的过期时间（Unix 秒）
    pub expires_at: Option<i64>,
}

impl CachedIdentity {
    /// Entry bounded only by the cache TTL.
    #[must_use]
    pub const fn new(identity: Identity) -> Self {
        Self {
            identity,
            expires_at: None,
        }
    }

    /// Entry that also stops being valid at `exp`.
    #[must_use]
    pub const fn expiring(identity: Identity, expires_at: i64) -> Self {
        Self {
            identity,
            expires_at: Some(expires_at),
        }
    }

    /// Same rule as [`TokenClaims::is_expired_at`]: valid strictly before `exp`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now.timestamp() >= exp)
    }
}

impl From<VerifiedToken> for CachedIdentity {
    fn from(token: VerifiedToken) -> Self {
        Self::expiring(token.identity, token.expires_at)
    }
}

/// Sanitize a secret-bearing key for logging.
#[must_use]
pub fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();
    if len > 20 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[len - 8..].iter().collect();
        format!("{head}***{tail}")
    } else if len > 8 {
        let head: String = chars[..4].iter().collect();
        format!("{head}***")
    } else {
        "***".to_string()
    }
}
