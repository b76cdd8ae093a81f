//! Common test utilities
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;

use bank_service::api::{self, AppState};
use bank_service::{db, Bank, InMemoryStore};

pub type MemoryBank = Bank<InMemoryStore, InMemoryStore>;

/// Engine over a fresh in-memory store, plus a handle on that store
pub fn memory_bank() -> (MemoryBank, InMemoryStore) {
    let store = InMemoryStore::new();
    let bank = Bank::new(tracing::Span::none(), store.clone(), store.clone());
    (bank, store)
}

/// Full application router over a fresh in-memory store
pub fn memory_app() -> (Router, InMemoryStore) {
    let (bank, store) = memory_bank();
    let state = AppState::new(Arc::new(bank), Duration::from_secs(5));
    (api::app(state), store)
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send one request through the router
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Create an account and return its identifier
pub async fn create_account(app: &Router, name: &str, balance: i64) -> String {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/accounts",
            serde_json::json!({ "name": name, "balance": balance }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "account creation failed: {}", response.body);

    response.body["account_uuid"]
        .as_str()
        .expect("account_uuid missing")
        .to_string()
}

/// Read an account's balance through the API
pub async fn balance_of(app: &Router, account_uuid: &str) -> i64 {
    let uri = format!("/accounts/{}", account_uuid);
    let response = send(app, empty_request(Method::GET, &uri)).await;
    assert_eq!(response.status, StatusCode::OK, "get failed: {}", response.body);
    response.body["balance"].as_i64().expect("balance missing")
}

/// Connect to the test database and start from an empty accounts table
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::ensure_schema(&pool).await.expect("Failed to create schema");

    sqlx::query("TRUNCATE TABLE accounts")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
