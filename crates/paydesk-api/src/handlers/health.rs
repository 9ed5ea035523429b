//! Health Check Handlers

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};

use crate::dto::{ComponentStatus, HealthResponse, ReadinessResponse};
use crate::state::AppState;

/// Health check endpoint
///
/// Returns 200 whenever the process is serving; dependencies are not checked.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}

/// Readiness check endpoint
///
/// Returns 200 once the transaction store answers a ping.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service is not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let start = Instant::now();

    let (status_code, status, storage) = match state.stores.transactions.ping().await {
        Ok(()) => (
            StatusCode::OK,
            "ready",
            ComponentStatus {
                status: "healthy".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            },
        ),
        Err(e) => {
            tracing::error!(error = %e, "Storage readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_ready",
                ComponentStatus {
                    status: "unhealthy".to_string(),
                    latency_ms: None,
                },
            )
        }
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: status.to_string(),
            storage,
        }),
    )
}
