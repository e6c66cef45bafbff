//! # 认证模块
//!
//! 请求认证引擎：基础认证与 Bearer Token 策略、共享的身份缓存、令牌签发，
//! 以及在每个请求上执行认证的 axum 中间件。

pub mod header_parser;
pub mod jwt;
pub mod middleware;
pub mod service;
pub mod strategies;
pub mod types;
pub mod validator;

pub use jwt::{JwtVerifier, SigningKeys, TokenIssuer};
pub use middleware::{AuthenticatedUser, auth_gate};
pub use service::AuthService;
pub use strategies::{
    AuthStrategy, CredentialStrategy, TokenStrategy, TokenVerifier, UnionStrategy, UserValidator,
};
pub use types::{
    BasicCredential, CachedIdentity, Identity, IdentityCache, StrategyKind, TokenClaims,
    VerifiedToken,
};
pub use validator::StaticUserValidator;
