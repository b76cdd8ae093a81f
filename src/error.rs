//! Error handling module
//!
//! Transport error type, its status codes and HTTP response conversion.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::{BankError, Interrupted};

/// Transport-level Result type
pub type ApiResult<T> = Result<T, ApiError>;

/// RPC status codes returned to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Cancelled,
    DeadlineExceeded,
    Internal,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::Cancelled => "CANCELLED",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::Internal => "INTERNAL",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Code::InvalidArgument => StatusCode::BAD_REQUEST,
            Code::NotFound => StatusCode::NOT_FOUND,
            Code::AlreadyExists => StatusCode::CONFLICT,
            // 499 Client Closed Request
            Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT),
            Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors returned by the transport adapter.
///
/// Messages are what the caller sees; `Internal` never carries detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    /// GetAccount / DeleteAccount on an unknown account
    #[error("account not found")]
    NotFound,

    /// Deposit / Withdraw / Refund on an unknown account
    #[error("target account not found")]
    AccountNotFound,

    #[error("account already exists")]
    AlreadyExists,

    #[error("request cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("service layer error")]
    Internal,
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn parse_uuid() -> Self {
        Self::invalid_argument("incorrect format of account uuid")
    }

    pub fn incorrect_amount() -> Self {
        Self::invalid_argument("incorrect amount")
    }

    /// Map an engine error raised by a balance operation
    pub fn for_balance_op(err: BankError) -> Self {
        match err {
            BankError::NotFound => Self::AccountNotFound,
            other => Self::from(other),
        }
    }

    pub fn code(&self) -> Code {
        match self {
            ApiError::InvalidArgument(_) => Code::InvalidArgument,
            ApiError::NotFound | ApiError::AccountNotFound => Code::NotFound,
            ApiError::AlreadyExists => Code::AlreadyExists,
            ApiError::Cancelled => Code::Cancelled,
            ApiError::DeadlineExceeded => Code::DeadlineExceeded,
            ApiError::Internal => Code::Internal,
        }
    }
}

impl From<BankError> for ApiError {
    fn from(err: BankError) -> Self {
        match err {
            BankError::NotFound => ApiError::NotFound,
            BankError::AlreadyExists => ApiError::AlreadyExists,
            BankError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            BankError::Interrupted(Interrupted::Cancelled) => ApiError::Cancelled,
            BankError::Interrupted(Interrupted::DeadlineExceeded) => ApiError::DeadlineExceeded,
            err @ BankError::Internal { .. } => {
                tracing::error!(error = %err, "Service layer error");
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidArgument(format!("malformed request: {}", rejection.body_text()))
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let body = ErrorResponse {
            error: self.to_string(),
            error_code: code.as_str().to_string(),
        };

        (code.http_status(), Json(body)).into_response()
    }
}
