//! # 认证中间件
//!
//! 对每个请求调用组合策略，成功则将身份注入请求扩展，失败直接返回 401。

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::auth::strategies::UnionStrategy;
use crate::auth::types::Identity;
use crate::error::{AuthError, GateError};

/// 已认证用户，由认证中间件写入请求扩展
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
    /// 当前请求的身份
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // 路由未挂载认证中间件时同样按未认证处理
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AuthError::unauthenticated(None).into())
    }
}

/// Axum认证中间件
pub async fn auth_gate(
    State(union): State<Arc<UnionStrategy>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let identity = union.authenticate_request(request.headers()).await?;

    info!(username = identity.username(), "user {} authenticated", identity.username());
    request
        .extensions_mut()
        .insert(AuthenticatedUser(identity));

    Ok(next.run(request).await)
}
