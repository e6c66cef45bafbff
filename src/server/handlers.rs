//! # 请求处理器

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::{debug, info};

use super::state::AppState;
use crate::auth::AuthenticatedUser;
use crate::error::GateError;

/// 为当前已认证用户签发令牌，响应体为纯文本令牌
pub async fn issue_token(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<String, GateError> {
    let token = state.auth().issuer.issue(&identity)?;
    info!(username = identity.username(), "token issued");
    Ok(token)
}

/// 按编号查询作者
pub async fn get_book_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Option<String>>) {
    info!(id = %id, "book lookup");
    match state.books().author(&id) {
        Some(author) => (StatusCode::OK, Json(Some(author.to_string()))),
        None => {
            debug!(id = %id, "book not found");
            (StatusCode::NOT_FOUND, Json(None))
        }
    }
}

/// Any path without a route. Only reached by authenticated callers.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
