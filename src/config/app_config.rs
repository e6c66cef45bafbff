//! # 应用配置结构定义

use std::collections::HashSet;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::ensure_config;
use crate::error::Result;

/// 应用主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 认证配置
    pub auth: AuthConfig,
    /// 缓存配置
    pub cache: CacheConfig,
    /// CORS 配置
    pub cors: CorsConfig,
    /// 静态用户表
    pub users: Vec<UserEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            cache: CacheConfig::default(),
            cors: CorsConfig::default(),
            users: default_users(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_address: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 令牌签发与校验配置
    pub token: TokenConfig,
    /// bcrypt cost used when hashing plaintext passwords at load time
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: TokenConfig::default(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// JWT 配置
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC 密钥
    pub secret: String,
    /// 签名算法，仅支持 HS256/HS384/HS512
    pub algorithm: Algorithm,
    /// 签发者
    pub issuer: String,
    /// 受众
    pub audience: String,
    /// 令牌有效期（秒）
    pub lifetime_secs: u64,
}

impl TokenConfig {
    /// 令牌有效期
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "secret".to_string(),
            algorithm: Algorithm::HS256,
            issuer: "auth-app".to_string(),
            audience: "any".to_string(),
            lifetime_secs: 300,
        }
    }
}

// 密钥不进日志
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"***")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime_secs", &self.lifetime_secs)
            .finish()
    }
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 过期时间（秒）
    pub ttl_secs: u64,
    /// 最大条目数，0 表示不限制
    pub max_entries: usize,
    /// 后台清理周期（秒），0 表示只在访问时淘汰
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    /// 缓存 TTL
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// 后台清理间隔，配置为 0 时为 `None`
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.sweep_interval_secs))
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 0,
            sweep_interval_secs: 60,
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// 是否启用CORS
    pub enabled: bool,
    /// 允许的CORS源地址，`*` 表示回显请求源
    pub origins: Vec<String>,
}

impl CorsConfig {
    /// Whether `*` appears among the allowed origins.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.origins.iter().any(|origin| origin == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["*".to_string()],
        }
    }
}

/// 用户表条目
#[derive(Clone, Serialize, Deserialize)]
pub struct UserEntry {
    /// 用户名
    pub username: String,
    /// 用户 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 用户组
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// bcrypt 哈希
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// 明文密码，加载时哈希
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("username", &self.username)
            .field("id", &self.id)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

fn default_users() -> Vec<UserEntry> {
    vec![UserEntry {
        username: "admin".to_string(),
        id: Some("1".to_string()),
        groups: Vec::new(),
        password_hash: None,
        password: Some("admin".to_string()),
    }]
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        let token = &self.auth.token;
        ensure_config!(!token.secret.is_empty(), "auth.token.secret cannot be empty");
        ensure_config!(
            matches!(
                token.algorithm,
                Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
            ),
            "auth.token.algorithm must be HS256, HS384 or HS512, got {:?}",
            token.algorithm
        );
        ensure_config!(token.lifetime_secs > 0, "auth.token.lifetime_secs must be greater than 0");
        ensure_config!(!token.issuer.is_empty(), "auth.token.issuer cannot be empty");
        ensure_config!(!token.audience.is_empty(), "auth.token.audience cannot be empty");
        ensure_config!(
            (4..=31).contains(&self.auth.bcrypt_cost),
            "auth.bcrypt_cost must be between 4 and 31, got {}",
            self.auth.bcrypt_cost
        );

        ensure_config!(self.cache.ttl_secs > 0, "cache.ttl_secs must be greater than 0");

        let mut seen = HashSet::new();
        for user in &self.users {
            ensure_config!(!user.username.is_empty(), "username cannot be empty");
            ensure_config!(
                seen.insert(user.username.as_str()),
                "duplicate user '{}'",
                user.username
            );
            ensure_config!(
                user.password_hash.is_some() || user.password.is_some(),
                "user '{}' needs password_hash or password",
                user.username
            );
        }

        if self.cors.enabled {
            for origin in self.cors.origins.iter().filter(|o| o.as_str() != "*") {
                ensure_config!(
                    origin.parse::<axum::http::HeaderValue>().is_ok(),
                    "invalid CORS origin '{}'",
                    origin
                );
            }
        }

        Ok(())
    }
}
