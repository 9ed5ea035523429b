//! Custom Axum Extractors
//!
//! Validated JSON bodies, the client key for rate limiting and transaction
//! ids from the path. Actor extraction lives in `paydesk_auth`.

use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use paydesk_auth::extract_client_ip;
use paydesk_types::TransactionId;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// JSON extractor with validation
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + validator::Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Client IP Extractor
// =============================================================================

/// Client key used by the abuse guard
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn from_parts(parts: &Parts, trust_proxy_headers: bool) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self(extract_client_ip(&parts.headers, peer, trust_proxy_headers))
    }
}

// =============================================================================
// Transaction Id Extractor
// =============================================================================

/// `:id` path segment parsed as a [`TransactionId`]
pub struct TransactionPath(pub TransactionId);

#[async_trait]
impl<S> FromRequestParts<S> for TransactionPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        TransactionId::parse(&raw)
            .map(TransactionPath)
            .map_err(|_| ApiError::bad_request(format!("Invalid transaction id: {raw}")))
    }
}
