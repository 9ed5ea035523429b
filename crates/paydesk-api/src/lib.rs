//! Paydesk REST API
//!
//! HTTP surface of the payment desk: customers create payments and SWIFT
//! transfers, employees review them.
//!
//! # API Structure
//!
//! ```text
//! /api/v1/
//! ├── /auth                                  - register, login, me
//! ├── /payments                              - create, list by status, review
//! │   ├── /transfer                          - SWIFT transfers
//! │   ├── /history                           - the caller's own transactions
//! │   └── /:id[/status|approve|reject|submit|override]
//! └── /accounts/:account_number/transactions - one account's transactions
//! /health, /ready                            - probes
//! /swagger-ui, /api-docs/openapi.json        - documentation
//! ```
//!
//! Requests under `/api/v1` pass the abuse guard first, then the identity
//! gate. Every response carries the security headers.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use state::AppState;

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Enable CORS for browser clients
    pub enable_cors: bool,
    /// Allowed origins for CORS; `*` allows any
    pub cors_origins: Vec<String>,
    /// Enable response compression
    pub enable_compression: bool,
    /// Enable request tracing
    pub enable_tracing: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Requests slower than this are logged at warn
    #[serde(with = "humantime_serde")]
    pub slow_request_threshold: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            enable_compression: true,
            enable_tracing: true,
            max_body_size: 64 * 1024,
            slow_request_threshold: Duration::from_secs(1),
        }
    }
}

/// Create the main API router with all middleware
pub fn create_router(state: Arc<AppState>, config: ApiConfig) -> Router {
    let api = routes::api_v1_routes()
        .layer(state.auth.layer())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ));

    let mut router = Router::new()
        .nest("/api/v1", api)
        // Probes at root
        .route("/health", axum::routing::get(handlers::health_check))
        .route("/ready", axum::routing::get(handlers::readiness_check))
        .merge(routes::swagger_routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(from_fn_with_state(
            middleware::SlowRequestThreshold(config.slow_request_threshold),
            middleware::timing_middleware,
        ));

    if config.enable_tracing {
        router = router.layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            },
        ));
    }

    // Outside the trace layer so the span sees the id
    let x_request_id = HeaderName::from_static("x-request-id");
    router = router
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    if config.enable_compression {
        router = router.layer(CompressionLayer::new());
    }

    if config.enable_cors {
        let cors = if config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(
                    config
                        .cors_origins
                        .iter()
                        .filter_map(|o| o.parse().ok())
                        .collect::<Vec<_>>(),
                )
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any)
        };
        router = router.layer(cors);
    }

    router.layer(from_fn(middleware::security_headers_middleware))
}

/// Full router without tracing or compression, for tests
pub fn create_test_router(state: Arc<AppState>) -> Router {
    create_router(
        state,
        ApiConfig {
            enable_compression: false,
            enable_tracing: false,
            ..ApiConfig::default()
        },
    )
}
