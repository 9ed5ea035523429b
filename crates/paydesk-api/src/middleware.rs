//! API Middleware
//!
//! Rate limiting per bucket, request timing and security headers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use paydesk_auth::{AuthError, RateBucket};

use crate::error::ApiError;
use crate::extractors::ClientIp;
use crate::state::AppState;

/// Bucket a request is counted against; `None` for unlimited paths
pub fn bucket_for(method: &Method, path: &str) -> Option<RateBucket> {
    let path = path.strip_prefix("/api/v1").unwrap_or(path);
    let path = path.trim_end_matches('/');

    let is_post = *method == Method::POST;

    match path {
        "/health" | "/ready" => None,
        p if p.starts_with("/swagger-ui") || p.starts_with("/api-docs") => None,
        "/auth/login" | "/auth/register" if is_post => Some(RateBucket::Auth),
        "/payments" | "/payments/transfer" if is_post => Some(RateBucket::PaymentCreate),
        _ => Some(RateBucket::General),
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(bucket) = bucket_for(req.method(), req.uri().path()) else {
        return next.run(req).await;
    };

    let (parts, body) = req.into_parts();
    let trust_proxy_headers = state.auth.config().rate_limit.trust_proxy_headers;
    let ClientIp(client) = ClientIp::from_parts(&parts, trust_proxy_headers);
    let guard = &state.auth.guard;

    if !guard.admit(&client, bucket).await {
        let wait = guard.retry_after(&client, bucket).await;
        return ApiError::from(AuthError::rate_limited(wait)).into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}

/// Threshold above which a request is logged as slow
#[derive(Debug, Clone, Copy)]
pub struct SlowRequestThreshold(pub Duration);

/// Request timing middleware
pub async fn timing_middleware(
    State(SlowRequestThreshold(threshold)): State<SlowRequestThreshold>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;

    let elapsed = start.elapsed();

    if elapsed > threshold {
        tracing::warn!(
            method = %method,
            uri = %uri,
            elapsed_ms = elapsed.as_millis() as u64,
            "Slow request detected"
        );
    } else {
        tracing::debug!(
            method = %method,
            uri = %uri,
            elapsed_ms = elapsed.as_millis() as u64,
            status = response.status().as_u16(),
            "Request completed"
        );
    }

    response
}

const SECURITY_HEADERS: &[(HeaderName, &str)] = &[
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::CONTENT_SECURITY_POLICY, "frame-ancestors 'none'"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
    (header::STRICT_TRANSPORT_SECURITY, "max-age=31536000; includeSubDomains"),
    (header::CACHE_CONTROL, "no-store"),
];

/// Security headers middleware
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name.clone(), HeaderValue::from_static(*value));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_for() {
        assert_eq!(bucket_for(&Method::POST, "/api/v1/auth/login"), Some(RateBucket::Auth));
        assert_eq!(bucket_for(&Method::POST, "/auth/register"), Some(RateBucket::Auth));
        assert_eq!(bucket_for(&Method::GET, "/auth/me"), Some(RateBucket::General));
        assert_eq!(bucket_for(&Method::POST, "/payments"), Some(RateBucket::PaymentCreate));
        assert_eq!(bucket_for(&Method::POST, "/payments/transfer/"), Some(RateBucket::PaymentCreate));
        assert_eq!(bucket_for(&Method::GET, "/payments"), Some(RateBucket::General));
        assert_eq!(bucket_for(&Method::POST, "/payments/abc/approve"), Some(RateBucket::General));
        assert_eq!(bucket_for(&Method::GET, "/health"), None);
        assert_eq!(bucket_for(&Method::GET, "/swagger-ui/index.html"), None);
    }
}
