//! Lifecycle errors

use paydesk_db::DbError;
use paydesk_types::{FieldViolation, TransactionStatus};
use thiserror::Error;

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors returned by [`crate::PaymentLifecycle`]
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Every violated field, not just the first
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldViolation>),

    #[error("Cannot move a {from} record to {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// A concurrent change moved the record first
    #[error("Record changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        expected: TransactionStatus,
        actual: TransactionStatus,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl LifecycleError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Conflict { .. } => "CONFLICT",
            Self::Storage(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::InvalidTransition { .. } | Self::Conflict { .. } => 409,
            Self::Storage(_) => 500,
        }
    }

    /// Storage faults are the only unexpected errors
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
