//! API Routes
//!
//! One route per bank operation. Each handler decodes the request, checks its
//! shape, calls the engine and maps the outcome to a status.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bank::BankService;
use crate::domain::{NewAccount, TransactionDetails};
use crate::error::{ApiError, ApiResult};

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

// Missing fields decode to their zero value and are rejected by validation.

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateAccountRequest {
    pub name: String,
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub account_uuid: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetAccountResponse {
    pub account_uuid: String,
    pub name: String,
    pub balance: i64,
}

/// Body of deposit, withdraw and refund
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountRequest {
    pub amount: i64,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router<S: BankService>() -> Router<AppState<S>> {
    Router::new()
        .route("/accounts", post(create_account::<S>))
        .route(
            "/accounts/:account_uuid",
            get(get_account::<S>).delete(delete_account::<S>),
        )
        .route("/accounts/:account_uuid/deposit", post(deposit::<S>))
        .route("/accounts/:account_uuid/withdraw", post(withdraw::<S>))
        .route("/accounts/:account_uuid/refund", post(refund::<S>))
}

fn parse_account_uuid(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::parse_uuid())
}

/// Decode and check a balance operation request.
///
/// Stricter than the engine: zero is rejected here.
fn transaction_details(
    raw_uuid: &str,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<TransactionDetails> {
    let Json(request) = payload?;
    let account_uuid = parse_account_uuid(raw_uuid)?;
    if request.amount <= 0 {
        return Err(ApiError::incorrect_amount());
    }
    Ok(TransactionDetails::new(account_uuid, request.amount))
}

// =========================================================================
// POST /accounts
// =========================================================================

async fn create_account<S: BankService>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateAccountResponse>)> {
    let Json(request) = payload?;

    if request.name.is_empty() {
        return Err(ApiError::invalid_argument("empty account name"));
    }
    if request.balance < 0 {
        return Err(ApiError::invalid_argument("negative balance forbidden"));
    }

    let ctx = state.request_context(&headers);
    let account_uuid = state
        .bank
        .create_account(&ctx, NewAccount::new(request.name, request.balance))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            account_uuid: account_uuid.to_string(),
        }),
    ))
}

// =========================================================================
// GET /accounts/:account_uuid
// =========================================================================

async fn get_account<S: BankService>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(account_uuid): Path<String>,
) -> ApiResult<Json<GetAccountResponse>> {
    let account_uuid = parse_account_uuid(&account_uuid)?;

    let ctx = state.request_context(&headers);
    let account = state.bank.get_account(&ctx, account_uuid).await?;

    Ok(Json(GetAccountResponse {
        account_uuid: account.id.to_string(),
        name: account.name,
        balance: account.balance,
    }))
}

// =========================================================================
// DELETE /accounts/:account_uuid
// =========================================================================

async fn delete_account<S: BankService>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(account_uuid): Path<String>,
) -> ApiResult<StatusCode> {
    let account_uuid = parse_account_uuid(&account_uuid)?;

    let ctx = state.request_context(&headers);
    state.bank.delete_account(&ctx, account_uuid).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// POST /accounts/:account_uuid/{deposit,withdraw,refund}
// =========================================================================

async fn deposit<S: BankService>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(account_uuid): Path<String>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let details = transaction_details(&account_uuid, payload)?;

    let ctx = state.request_context(&headers);
    state
        .bank
        .deposit(&ctx, details)
        .await
        .map_err(ApiError::for_balance_op)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn withdraw<S: BankService>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(account_uuid): Path<String>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let details = transaction_details(&account_uuid, payload)?;

    let ctx = state.request_context(&headers);
    state
        .bank
        .withdraw(&ctx, details)
        .await
        .map_err(ApiError::for_balance_op)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn refund<S: BankService>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(account_uuid): Path<String>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let details = transaction_details(&account_uuid, payload)?;

    let ctx = state.request_context(&headers);
    state
        .bank
        .refund(&ctx, details)
        .await
        .map_err(ApiError::for_balance_op)?;

    Ok(StatusCode::NO_CONTENT)
}
