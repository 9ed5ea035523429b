//! Authentication Middleware for Axum
//!
//! [`AuthLayer`] runs the [`IdentityGate`] for every request that carries an
//! `Authorization` header and stores the resolved [`Actor`] in the request
//! extensions. Handlers opt into authentication with the [`RequireAuth`]
//! extractor.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::Response,
};
use paydesk_types::Actor;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::{AuthError, ErrorResponse};
use crate::gate::IdentityGate;

/// Authentication middleware layer
#[derive(Clone)]
pub struct AuthLayer {
    gate: Arc<IdentityGate>,
}

impl AuthLayer {
    pub fn new(gate: Arc<IdentityGate>) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    gate: Arc<IdentityGate>,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let gate = self.gate.clone();
        // Take the instance that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let header = match req.headers().get(AUTHORIZATION) {
                // No credentials: the handler decides whether that is acceptable
                None => return inner.call(req).await,
                Some(value) => value.to_str().ok().map(str::to_owned),
            };

            match gate.authenticate(header.as_deref()).await {
                Ok(actor) => {
                    let (mut parts, body) = req.into_parts();
                    parts.extensions.insert(actor);
                    inner.call(Request::from_parts(parts, body)).await
                }
                Err(e) => {
                    if e.is_server_error() {
                        tracing::error!(error = %e, "Identity resolution failed");
                    }
                    Ok(auth_error_response(e))
                }
            }
        })
    }
}

/// Create error response for authentication errors
pub fn auth_error_response(error: AuthError) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let response = ErrorResponse::from(&error);

    let mut res = Response::builder()
        .status(status)
        .header("Content-Type", "application/json");

    if let Some(retry_after) = response.retry_after {
        res = res.header("Retry-After", retry_after.to_string());
    }

    res.body(Body::from(serde_json::to_string(&response).unwrap_or_default()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

// =============================================================================
// Axum Extractors
// =============================================================================

/// Extractor for the authenticated actor; 401 when there is none
pub struct RequireAuth(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(RequireAuth)
            .ok_or_else(|| auth_error_response(AuthError::Unauthenticated))
    }
}

/// Extractor that additionally requires the employee role
pub struct RequireEmployee(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for RequireEmployee
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(actor) = RequireAuth::from_request_parts(parts, state).await?;

        if actor.is_employee() {
            Ok(RequireEmployee(actor))
        } else {
            Err(auth_error_response(AuthError::Forbidden))
        }
    }
}
