//! API integration tests
//!
//! Drive the full router over the in-memory store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use uuid::Uuid;

use bank_service::api::{self, AppState};
use bank_service::domain::Canceller;
use bank_service::{
    Account, BankError, BankResult, BankService, NewAccount, RequestContext, StoreError,
    TransactionDetails,
};

use common::{
    balance_of, create_account, empty_request, json_request, memory_app, memory_bank, send,
};

fn amount(value: i64) -> serde_json::Value {
    json!({ "amount": value })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = memory_app();

    let response = send(&app, empty_request(Method::GET, "/health")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!("OK"));
}

#[tokio::test]
async fn test_create_then_get_returns_account() {
    let (app, _) = memory_app();

    let alice = create_account(&app, "Alice", 1000).await;
    let bob = create_account(&app, "Bob", 0).await;
    assert_ne!(alice, bob);
    assert!(Uuid::parse_str(&alice).is_ok());

    let response = send(&app, empty_request(Method::GET, &format!("/accounts/{}", alice))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({ "account_uuid": alice, "name": "Alice", "balance": 1000 })
    );
}

#[tokio::test]
async fn test_negative_initial_balance_never_reaches_store() {
    let (app, store) = memory_app();

    let response = send(
        &app,
        json_request(Method::POST, "/accounts", json!({ "name": "Alice", "balance": -1 })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error_code"], "INVALID_ARGUMENT");
    assert_eq!(response.body["error"], "negative balance forbidden");
    assert_eq!(store.calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_empty_name_rejected() {
    let (app, store) = memory_app();

    let response = send(
        &app,
        json_request(Method::POST, "/accounts", json!({ "balance": 10 })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "empty account name");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let (app, store) = memory_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/accounts")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error_code"], "INVALID_ARGUMENT");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_duplicate_name_conflicts() {
    let (app, _) = memory_app();
    create_account(&app, "Alice", 10).await;

    let response = send(
        &app,
        json_request(Method::POST, "/accounts", json!({ "name": "Alice", "balance": 20 })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error_code"], "ALREADY_EXISTS");
    assert_eq!(response.body["error"], "account already exists");
}

#[tokio::test]
async fn test_invalid_uuid_rejected_before_store() {
    let (app, store) = memory_app();

    for method in [Method::GET, Method::DELETE] {
        let response = send(&app, empty_request(method, "/accounts/not-a-uuid")).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "incorrect format of account uuid");
    }

    let response = send(
        &app,
        json_request(Method::POST, "/accounts/not-a-uuid/deposit", amount(10)),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_unknown_account_not_found() {
    let (app, _) = memory_app();
    let missing = Uuid::new_v4();

    for method in [Method::GET, Method::DELETE] {
        let response = send(&app, empty_request(method, &format!("/accounts/{}", missing))).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["error_code"], "NOT_FOUND");
        assert_eq!(response.body["error"], "account not found");
    }
}

#[tokio::test]
async fn test_balance_op_on_unknown_account() {
    let (app, _) = memory_app();
    let uri = format!("/accounts/{}/withdraw", Uuid::new_v4());

    let response = send(&app, json_request(Method::POST, &uri, amount(100))).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error_code"], "NOT_FOUND");
    assert_eq!(response.body["error"], "target account not found");
}

#[tokio::test]
async fn test_deposit_withdraw_scenario() {
    let (app, _) = memory_app();
    let alice = create_account(&app, "Alice", 1000).await;

    let response = send(
        &app,
        json_request(Method::POST, &format!("/accounts/{}/deposit", alice), amount(500)),
    )
    .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body, serde_json::Value::Null);

    let response = send(
        &app,
        json_request(Method::POST, &format!("/accounts/{}/withdraw", alice), amount(300)),
    )
    .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    assert_eq!(balance_of(&app, &alice).await, 1200);
}

#[tokio::test]
async fn test_refund_adds_to_balance() {
    let (app, _) = memory_app();
    let alice = create_account(&app, "Alice", 100).await;

    let response = send(
        &app,
        json_request(Method::POST, &format!("/accounts/{}/refund", alice), amount(25)),
    )
    .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(balance_of(&app, &alice).await, 125);
}

#[tokio::test]
async fn test_withdraw_may_overdraw() {
    let (app, _) = memory_app();
    let alice = create_account(&app, "Alice", 50).await;

    let response = send(
        &app,
        json_request(Method::POST, &format!("/accounts/{}/withdraw", alice), amount(80)),
    )
    .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(balance_of(&app, &alice).await, -30);
}

#[tokio::test]
async fn test_zero_and_negative_amounts_rejected_at_transport() {
    let (app, store) = memory_app();
    let alice = create_account(&app, "Alice", 100).await;
    let calls = store.calls();

    for op in ["deposit", "withdraw", "refund"] {
        for value in [0, -5] {
            let uri = format!("/accounts/{}/{}", alice, op);
            let response = send(&app, json_request(Method::POST, &uri, amount(value))).await;

            assert_eq!(response.status, StatusCode::BAD_REQUEST, "{} {}", op, value);
            assert_eq!(response.body["error"], "incorrect amount");
        }
    }

    // Missing amount decodes to zero
    let uri = format!("/accounts/{}/deposit", alice);
    let response = send(&app, json_request(Method::POST, &uri, json!({}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(store.calls(), calls);
    assert_eq!(balance_of(&app, &alice).await, 100);
}

#[tokio::test]
async fn test_delete_then_get_not_found() {
    let (app, _) = memory_app();
    let alice = create_account(&app, "Alice", 10).await;
    let uri = format!("/accounts/{}", alice);

    let response = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_are_not_lost() {
    const DEPOSITS: i64 = 100;
    const AMOUNT: i64 = 7;

    let (app, _) = memory_app();
    let alice = create_account(&app, "Alice", 1000).await;
    let uri = format!("/accounts/{}/deposit", alice);

    let mut handles = Vec::new();
    for _ in 0..DEPOSITS {
        let app = app.clone();
        let uri = uri.clone();
        handles.push(tokio::spawn(async move {
            send(&app, json_request(Method::POST, &uri, amount(AMOUNT))).await.status
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::NO_CONTENT);
    }

    assert_eq!(balance_of(&app, &alice).await, 1000 + DEPOSITS * AMOUNT);
}

#[tokio::test]
async fn test_request_id_propagated() {
    let (app, _) = memory_app();
    let request_id = Uuid::new_v4().to_string();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("x-request-id", &request_id)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(
        response.headers.get("x-request-id").and_then(|v| v.to_str().ok()),
        Some(request_id.as_str())
    );

    // Generated when absent
    let response = send(&app, empty_request(Method::GET, "/health")).await;
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_expired_deadline_reported() {
    let (app, _) = memory_app();
    let alice = create_account(&app, "Alice", 100).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/accounts/{}/deposit", alice))
        .header("content-type", "application/json")
        .header("x-request-timeout-ms", "0")
        .body(Body::from(amount(50).to_string()))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response.body["error_code"], "DEADLINE_EXCEEDED");
    assert_eq!(balance_of(&app, &alice).await, 100);
}

#[tokio::test]
async fn test_cancelled_requests_reported() {
    let (bank, store) = memory_bank();
    let canceller = Canceller::new();
    let state =
        AppState::new(Arc::new(bank), Duration::from_secs(5)).with_shutdown(canceller.token());
    let app = api::app(state);

    canceller.cancel();
    let response = send(
        &app,
        json_request(Method::POST, "/accounts", json!({ "name": "Alice", "balance": 1 })),
    )
    .await;

    assert_eq!(response.status.as_u16(), 499);
    assert_eq!(response.body["error_code"], "CANCELLED");
    assert!(store.is_empty());
}

/// Engine double whose store always fails
struct BrokenBank;

#[async_trait]
impl BankService for BrokenBank {
    async fn create_account(
        &self,
        _ctx: &RequestContext,
        _account: NewAccount,
    ) -> BankResult<Uuid> {
        Err(broken("Bank.CreateAccount"))
    }

    async fn get_account(&self, _ctx: &RequestContext, _account_uuid: Uuid) -> BankResult<Account> {
        Err(broken("Bank.GetAccount"))
    }

    async fn delete_account(&self, _ctx: &RequestContext, _account_uuid: Uuid) -> BankResult<()> {
        Err(broken("Bank.DeleteAccount"))
    }

    async fn deposit(&self, _ctx: &RequestContext, _details: TransactionDetails) -> BankResult<()> {
        Err(broken("Bank.Deposit"))
    }

    async fn withdraw(
        &self,
        _ctx: &RequestContext,
        _details: TransactionDetails,
    ) -> BankResult<()> {
        Err(broken("Bank.Withdraw"))
    }

    async fn refund(&self, _ctx: &RequestContext, _details: TransactionDetails) -> BankResult<()> {
        Err(broken("Bank.Refund"))
    }
}

fn broken(op: &'static str) -> BankError {
    BankError::from_store(op, StoreError::Database(sqlx::Error::PoolTimedOut))
}

#[tokio::test]
async fn test_internal_errors_are_opaque() {
    let app = api::app(AppState::new(Arc::new(BrokenBank), Duration::from_secs(5)));

    let uri = format!("/accounts/{}", Uuid::new_v4());
    let response = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body,
        json!({ "error": "service layer error", "error_code": "INTERNAL" })
    );

    let uri = format!("/accounts/{}/refund", Uuid::new_v4());
    let response = send(&app, json_request(Method::POST, &uri, amount(1))).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "service layer error");
}
