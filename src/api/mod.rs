//! API module
//!
//! HTTP transport for the bank engine: routes, middleware and shared state.

pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderMap, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::bank::BankService;
use crate::domain::{CancelToken, RequestContext};

pub use routes::create_router;

/// Request id header, set by [`SetRequestIdLayer`] when the caller sends none
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Optional per-request timeout in milliseconds; may only shorten the server default
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// State shared by all handlers
pub struct AppState<S> {
    pub bank: Arc<S>,
    pub request_timeout: Duration,
    pub shutdown: Option<CancelToken>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            bank: Arc::clone(&self.bank),
            request_timeout: self.request_timeout,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: BankService> AppState<S> {
    pub fn new(bank: Arc<S>, request_timeout: Duration) -> Self {
        Self {
            bank,
            request_timeout,
            shutdown: None,
        }
    }

    /// Cancel in-flight calls when `token` fires
    pub fn with_shutdown(mut self, token: CancelToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Build the context for one request from its headers
    pub fn request_context(&self, headers: &HeaderMap) -> RequestContext {
        let correlation_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        let timeout = headers
            .get(REQUEST_TIMEOUT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .map_or(self.request_timeout, |requested| {
                requested.min(self.request_timeout)
            });

        let context = RequestContext::new()
            .with_correlation_id(correlation_id)
            .with_timeout(timeout);

        match &self.shutdown {
            Some(token) => context.with_cancel(token.clone()),
            None => context,
        }
    }
}

/// Build the application router with its middleware stack
pub fn app<S: BankService>(state: AppState<S>) -> Router {
    // Layers run outermost-first in reverse order of addition:
    // request id -> trace -> logging -> handler
    Router::new()
        .route("/health", get(health_check))
        .merge(create_router::<S>())
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
