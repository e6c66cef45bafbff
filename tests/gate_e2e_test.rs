//! # 认证网关端到端测试
//!
//! 通过 `tower::ServiceExt::oneshot` 驱动完整路由：凭据提取、组合策略、
//! 身份缓存、令牌签发与 CORS 预检。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use auth_gate::auth::{
    AuthService, AuthenticatedUser, Identity, JwtVerifier, SigningKeys, TokenIssuer,
    TokenVerifier, UserValidator, auth_gate,
};
use auth_gate::config::AppConfig;
use auth_gate::error::StrategyError;
use auth_gate::server::{AppState, BookCatalog, create_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use base64::{Engine as _, engine::general_purpose};
use pretty_assertions::assert_eq;
use tower::ServiceExt;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.bcrypt_cost = 4;
    config
}

fn basic(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{username}:{password}"))
    )
}

fn get_request(uri: &str, authorization: &[String]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for value in authorization {
        builder = builder.header(header::AUTHORIZATION, value.as_str());
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Full application router backed by `service`.
fn gate_app(service: AuthService, config: &AppConfig) -> Router {
    create_router(AppState::new(service, BookCatalog::reference()), &config.cors).unwrap()
}

/// Router with a single `/whoami` handler that counts its invocations.
fn whoami_app(service: &AuthService, hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/whoami",
            get(move |AuthenticatedUser(identity): AuthenticatedUser| {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    identity.username().to_string()
                }
            }),
        )
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&service.union),
            auth_gate,
        ))
}

fn counting_validator(calls: Arc<AtomicUsize>) -> Arc<dyn UserValidator> {
    Arc::new(move |username: &str, password: &str| {
        calls.fetch_add(1, Ordering::SeqCst);
        if username == "admin" && password == "admin" {
            Ok(Identity::new("admin").unwrap().with_id("1"))
        } else {
            Err(StrategyError::InvalidCredentials)
        }
    })
}

/// Engine whose token verification is counted, signed with the configured key.
fn counted_engine(
    config: &AppConfig,
    token_calls: Arc<AtomicUsize>,
    basic_calls: Arc<AtomicUsize>,
) -> AuthService {
    let token = &config.auth.token;
    let keys = Arc::new(SigningKeys::hmac(token.algorithm, token.secret.as_bytes()).unwrap());
    let jwt = JwtVerifier::new(Arc::clone(&keys), token);
    let verifier: Arc<dyn TokenVerifier> = Arc::new(move |raw: &str| {
        token_calls.fetch_add(1, Ordering::SeqCst);
        jwt.verify(raw)
    });
    let issuer = Arc::new(TokenIssuer::new(keys, token).unwrap());

    AuthService::assemble(config, verifier, counting_validator(basic_calls), issuer)
}

fn admin() -> Identity {
    Identity::new("admin").unwrap()
}

#[tokio::test]
async fn test_bearer_token_for_admin_is_forwarded() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();
    let token = service.issuer.issue(&admin()).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let response = whoami_app(&service, Arc::clone(&hits))
        .oneshot(get_request("/whoami", &[format!("Bearer {token}")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "admin");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_basic_without_bearer_is_rejected_before_handler() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let response = whoami_app(&service, Arc::clone(&hits))
        .oneshot(get_request("/whoami", &[basic("admin", "wrong")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "Unauthorized");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_credentials_are_rejected() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let response = whoami_app(&service, Arc::clone(&hits))
        .oneshot(get_request("/whoami", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_identity_preferred_over_basic() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();
    let token = service
        .issuer
        .issue(&Identity::new("alice").unwrap())
        .unwrap();

    let response = whoami_app(&service, Arc::new(AtomicUsize::new(0)))
        .oneshot(get_request(
            "/whoami",
            &[basic("admin", "admin"), format!("Bearer {token}")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "alice");
}

#[tokio::test]
async fn test_falls_back_to_basic_when_no_bearer() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();

    let response = whoami_app(&service, Arc::new(AtomicUsize::new(0)))
        .oneshot(get_request("/whoami", &[basic("admin", "admin")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "admin");
}

#[tokio::test]
async fn test_forged_token_falls_back_to_valid_basic() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();

    let response = whoami_app(&service, Arc::new(AtomicUsize::new(0)))
        .oneshot(get_request(
            "/whoami",
            &["Bearer not.a.token".to_string(), basic("admin", "admin")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "admin");
}

#[tokio::test(start_paused = true)]
async fn test_cached_token_is_reverified_after_ttl() {
    let config = test_config();
    let token_calls = Arc::new(AtomicUsize::new(0));
    let service = counted_engine(
        &config,
        Arc::clone(&token_calls),
        Arc::new(AtomicUsize::new(0)),
    );
    let bearer = format!("Bearer {}", service.issuer.issue(&admin()).unwrap());
    let app = whoami_app(&service, Arc::new(AtomicUsize::new(0)));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_request("/whoami", &[bearer.clone()]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(token_calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(config.cache.ttl() + Duration::from_secs(1)).await;

    let response = app
        .oneshot(get_request("/whoami", &[bearer]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(token_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_basic_validator_called_once_within_ttl() {
    let config = test_config();
    let basic_calls = Arc::new(AtomicUsize::new(0));
    let service = counted_engine(
        &config,
        Arc::new(AtomicUsize::new(0)),
        Arc::clone(&basic_calls),
    );
    let app = whoami_app(&service, Arc::new(AtomicUsize::new(0)));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_request("/whoami", &[basic("admin", "admin")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(basic_calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(config.cache.ttl() + Duration::from_secs(1)).await;
    app.oneshot(get_request("/whoami", &[basic("admin", "admin")]))
        .await
        .unwrap();
    assert_eq!(basic_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_book_lookup_behind_gate() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();
    let token = service.issuer.issue(&admin()).unwrap();
    let app = gate_app(service, &config);

    let response = app
        .clone()
        .oneshot(get_request("/v1/book/112333", &[format!("Bearer {token}")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "\"Ryan Boyd\"");

    let response = app
        .clone()
        .oneshot(get_request("/v1/book/999999", &[format!("Bearer {token}")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "null");

    let response = app
        .oneshot(get_request("/v1/book/112333", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_endpoint_issues_usable_token() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();
    let app = gate_app(service, &config);

    let response = app
        .clone()
        .oneshot(get_request("/v1/auth/token", &[basic("admin", "admin")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let token = body_string(response).await;
    assert_eq!(token.split('.').count(), 3);

    let response = app
        .oneshot(get_request("/v1/book/434444", &[format!("Bearer {token}")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "\"Yvonne Wilson\"");
}

#[tokio::test]
async fn test_token_endpoint_requires_credentials() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();

    let response = gate_app(service, &config)
        .oneshot(get_request("/v1/auth/token", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_path_is_gated() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();
    let app = gate_app(service, &config);

    let response = app
        .clone()
        .oneshot(get_request("/nowhere", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get_request("/nowhere", &[basic("admin", "admin")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_needs_no_credentials() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/v1/book/112333")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .unwrap();

    let response = gate_app(service, &config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn test_rejected_request_still_carries_cors_headers() {
    let config = test_config();
    let service = AuthService::from_config(&config).unwrap();

    let request = Request::builder()
        .uri("/v1/book/112333")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();

    let response = gate_app(service, &config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}
