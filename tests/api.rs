//! Full router: public health check, gated /foos and admin-only /admin.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use resource_gate::app::{build_router, build_state};
use resource_gate::config::Config;
use resource_gate::middleware::authorization::RequiredScope;
use resource_gate::services::verifier::{MemoryTokenVerifier, TokenClaims};
use resource_gate::state::AppState;

fn token(access_token: &str, scope: Option<&str>) -> TokenClaims {
    TokenClaims {
        access_token: access_token.into(),
        client_id: "demo-client".into(),
        user_id: format!("user-{access_token}"),
        expires: 99_999_999_900,
        scope: scope.map(str::to_string),
    }
}

fn config() -> Config {
    Config::from_vars(|_| None).unwrap()
}

fn state(config: &Config) -> AppState {
    let verifier = MemoryTokenVerifier::new()
        .with_token(token("reader", Some("foo:read")))
        .with_token(token("boss", Some("admin foo:read")));
    build_state(Arc::new(verifier), config)
}

fn app(config: &Config) -> Router {
    build_router(state(config), config)
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let resp = app(&config())
        .oneshot(get("/api/v1/health", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await["status"], "ok");
}

#[tokio::test]
async fn foos_without_token_is_challenged() {
    let resp = app(&config())
        .oneshot(get("/api/v1/foos", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers()[header::WWW_AUTHENTICATE],
        r#"Bearer realm="Service""#
    );
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
}

#[tokio::test]
async fn foos_with_token_sees_caller() {
    let resp = app(&config())
        .oneshot(get("/api/v1/foos", Some("reader")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json(resp).await;
    assert_eq!(body["caller"]["user_id"], "user-reader");
    assert_eq!(body["caller"]["scopes"], serde_json::json!(["foo:read"]));
}

#[tokio::test]
async fn patch_foos_echoes_body() {
    let request = Request::builder()
        .method("PATCH")
        .uri("/api/v1/foos")
        .header(header::AUTHORIZATION, "Bearer reader")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"bar"}"#))
        .unwrap();

    let resp = app(&config()).oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await["foo"]["name"], "bar");
}

#[tokio::test]
async fn admin_requires_admin_scope() {
    let resp = app(&config())
        .oneshot(get("/api/v1/admin", Some("reader")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json(resp).await["error"], "insufficient_scope");

    let resp = app(&config())
        .oneshot(get("/api/v1/admin", Some("boss")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await["user_id"], "user-boss");
}

#[tokio::test]
async fn configured_scope_guards_foos() {
    let mut config = config();
    config.required_scope = RequiredScope::any_of(["admin"]);

    let resp = app(&config)
        .oneshot(get("/api/v1/foos", Some("reader")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_route_is_404_not_401() {
    let resp = app(&config())
        .oneshot(get("/api/v1/nope", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let resp = app(&config())
        .oneshot(get("/api/v1/foos", None))
        .await
        .unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn no_claims_outlive_the_request() {
    let config = config();
    let state = state(&config);
    let router = build_router(state.clone(), &config);

    let resp = router
        .oneshot(get("/api/v1/foos", Some("reader")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let leftover = state.gate.claims_context().and_then(|ctx| ctx.token());
    assert_eq!(leftover, None);
}

#[tokio::test]
async fn concurrent_callers_see_their_own_claims() {
    let router = app(&config());

    let (reader, boss) = tokio::join!(
        router.clone().oneshot(get("/api/v1/foos", Some("reader"))),
        router.clone().oneshot(get("/api/v1/foos", Some("boss"))),
    );

    assert_eq!(json(reader.unwrap()).await["caller"]["user_id"], "user-reader");
    assert_eq!(json(boss.unwrap()).await["caller"]["user_id"], "user-boss");
}
