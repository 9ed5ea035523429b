//! API error handling
//!
//! Every failure leaves the API as `{code, message, details?, retryAfter?}`
//! with a stable machine-readable `code`. Storage and other internal faults
//! are logged with full context here and reach the client as a generic
//! `INTERNAL_ERROR`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use paydesk_auth::AuthError;
use paydesk_lifecycle::LifecycleError;
use paydesk_types::FieldViolation;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error
#[derive(Debug, Error)]
pub enum ApiError {
    // =========================================================================
    // Authentication Errors
    // =========================================================================
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Too many requests, try again in {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    // =========================================================================
    // Resource Errors
    // =========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    Conflict(String),

    #[error("An account with this account number already exists")]
    AccountExists,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Carries the cause for the log; never sent to the client
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable kind
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::Conflict(_) => "CONFLICT",
            Self::AccountExists => "ACCOUNT_EXISTS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition(_) | Self::Conflict(_) | Self::AccountExists => {
                StatusCode::CONFLICT
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// camelCase field name
    pub field: String,
    pub message: String,
}

impl From<&FieldViolation> for FieldError {
    fn from(violation: &FieldViolation) -> Self {
        Self {
            field: violation.field.clone(),
            message: violation.message.clone(),
        }
    }
}

/// Error body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine-readable kind, e.g. `VALIDATION_ERROR`
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Violated fields, validation errors only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    /// Seconds to wait, rate limiting only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        let details = match err {
            ApiError::Validation(violations) => {
                Some(violations.iter().map(FieldError::from).collect())
            }
            _ => None,
        };
        let retry_after = match err {
            ApiError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };

        Self {
            code: err.error_code().to_string(),
            message: err.client_message(),
            details,
            retry_after,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(cause) = &self {
            tracing::error!(error = %cause, "Request failed with internal error");
        }

        let status = self.status_code();
        let body = ErrorResponse::from(&self);
        let mut response = (status, Json(body)).into_response();

        if let Self::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => Self::Unauthenticated,
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::WeakPassword(message) => {
                Self::Validation(vec![FieldViolation::new("password", message)])
            }
            AuthError::AccountNotFound => Self::NotFound("account".to_string()),
            AuthError::AccountExists => Self::AccountExists,
            AuthError::Forbidden => Self::Forbidden("insufficient permissions".to_string()),
            AuthError::RateLimitExceeded { retry_after } => Self::RateLimited { retry_after },
            other @ (AuthError::PasswordHashingFailed
            | AuthError::Database(_)
            | AuthError::Config(_)
            | AuthError::Internal(_)) => Self::Internal(format!("{other:?}")),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Forbidden(reason) => Self::Forbidden(reason),
            LifecycleError::NotFound(what) => Self::NotFound(what),
            LifecycleError::Validation(violations) => Self::Validation(violations),
            e @ LifecycleError::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
            e @ LifecycleError::Conflict { .. } => Self::Conflict(e.to_string()),
            LifecycleError::Storage(db) => Self::Internal(db.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "is invalid".to_string());
                    FieldViolation::new(camel_case(field), message)
                })
            })
            .collect();
        // field_errors() is a HashMap
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        Self::Validation(violations)
    }
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
