//! # 路由配置
//!
//! 所有路由都挂在认证中间件之后，CORS 位于认证之外以便预检请求无需凭据

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;
use crate::auth::auth_gate;
use crate::config::CorsConfig;
use crate::error::{GateError, Result};

/// 创建完整路由
pub fn create_router(state: AppState, cors: &CorsConfig) -> Result<Router> {
    let union = Arc::clone(&state.auth().union);

    let mut app = Router::new()
        .nest("/v1", v1_routes())
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(union, auth_gate));

    if let Some(cors_layer) = cors_layer(cors)? {
        app = app.layer(cors_layer);
    }

    Ok(app.layer(TraceLayer::new_for_http()))
}

fn v1_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", get(handlers::issue_token))
        .route("/book/{id}", get(handlers::get_book_author))
}

/// 配置CORS
fn cors_layer(config: &CorsConfig) -> Result<Option<CorsLayer>> {
    if !config.enabled {
        return Ok(None);
    }

    // 任意源：回显请求源并允许携带凭据
    if config.allows_any_origin() {
        return Ok(Some(CorsLayer::very_permissive()));
    }

    let origins = config
        .origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| {
                GateError::config_with_source(format!("invalid CORS origin '{origin}'"), e)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true),
    ))
}
