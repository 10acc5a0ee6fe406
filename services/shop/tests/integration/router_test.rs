//! HTTP surface tests. The database is disconnected, so every request here must be
//! answered before a query would run.

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use uuid::Uuid;

use bazaar_core::config::Config;
use bazaar_shop::config::ShopConfig;
use bazaar_shop::infra::mail::{AppMailer, LogMailer};
use bazaar_shop::router::build_router;
use bazaar_shop::state::AppState;
use bazaar_testing::auth::MockAuth;

use crate::helpers::TEST_JWT_SECRET;

fn server() -> TestServer {
    let config = ShopConfig::try_from_pairs([
        ("DATABASE_URL".to_owned(), "postgres://unused/bazaar".to_owned()),
        ("JWT_SECRET".to_owned(), TEST_JWT_SECRET.to_owned()),
        ("COOKIE_SECURE".to_owned(), "false".to_owned()),
    ])
    .unwrap();
    let state = AppState::new(
        DatabaseConnection::Disconnected,
        &config,
        AppMailer::Log(LogMailer),
    );
    TestServer::new(build_router(state)).unwrap()
}

fn bearer(auth: &MockAuth) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", auth.access_token(TEST_JWT_SECRET))).unwrap()
}

fn customer() -> HeaderValue {
    bearer(&MockAuth::customer(Uuid::now_v7()))
}

fn admin() -> HeaderValue {
    bearer(&MockAuth::admin(Uuid::now_v7()))
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_liveness() {
    let resp = server().get("/healthz").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let resp = server().get("/readyz").await;
    assert_eq!(resp.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_attach_request_id() {
    let resp = server().get("/healthz").await;
    assert!(resp.headers().get("x-request-id").is_some());
}

// ── Authentication ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_missing_bearer() {
    let resp = server().get("/profile").await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<Value>()["kind"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn should_reject_bearer_signed_with_other_secret() {
    let token = MockAuth::customer(Uuid::now_v7()).access_token("other-secret");
    let resp = server()
        .get("/cart")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
        .await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_reject_refresh_without_cookie() {
    let resp = server().post("/auth/token/refresh").await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<Value>()["kind"], "INVALID_CREDENTIAL");
}

#[tokio::test]
async fn should_clear_refresh_cookie_on_logout() {
    let resp = server()
        .post("/auth/logout")
        .add_header(header::AUTHORIZATION, customer())
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(cookie.starts_with("refresh="), "unexpected cookie: {cookie}");
    assert!(cookie.contains("Max-Age=0"), "unexpected cookie: {cookie}");
}

#[tokio::test]
async fn should_validate_registration_before_touching_storage() {
    let resp = server()
        .post("/auth/register")
        .json(&json!({
            "username": "ana",
            "email": "ana@example.com",
            "password": "short",
        }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["kind"], "VALIDATION");
}

#[tokio::test]
async fn should_validate_new_password_on_reset() {
    let resp = server()
        .post("/reset-password")
        .json(&json!({ "token": "whatever", "new_password": "short" }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
}

// ── Payment ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_payment_methods() {
    let resp = server()
        .get("/payment/methods")
        .add_header(header::AUTHORIZATION, customer())
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let body = resp.json::<Value>();
    let values: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["value"].as_str())
        .collect();
    assert_eq!(values, vec!["upi", "bank_transfer"]);
}

#[tokio::test]
async fn should_reject_unknown_payment_method() {
    let resp = server()
        .post("/order/create")
        .add_header(header::AUTHORIZATION, customer())
        .json(&json!({ "address_id": Uuid::now_v7(), "payment_method": "cash" }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["kind"], "VALIDATION");
}

// ── Admin ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_forbid_admin_routes_to_customers() {
    let server = server();

    let resp = server
        .get("/admin-dashboard")
        .add_header(header::AUTHORIZATION, customer())
        .await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);

    let resp = server
        .get("/admin/manage?status=confirmed")
        .add_header(header::AUTHORIZATION, customer())
        .await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);

    let resp = server
        .post("/admin/manage/ORD202603010001/status")
        .add_header(header::AUTHORIZATION, customer())
        .json(&json!({ "status": "confirmed" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(resp.json::<Value>()["kind"], "FORBIDDEN");
}

#[tokio::test]
async fn should_require_valid_status_filter() {
    let server = server();

    let resp = server
        .get("/admin/manage")
        .add_header(header::AUTHORIZATION, admin())
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

    let resp = server
        .get("/admin/manage?status=lost")
        .add_header(header::AUTHORIZATION, admin())
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["kind"], "VALIDATION");
}

#[tokio::test]
async fn should_reject_unknown_admin_decision() {
    let resp = server()
        .post("/admin/manage/ORD202603010001/status")
        .add_header(header::AUTHORIZATION, admin())
        .json(&json!({ "status": "maybe" }))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
}
