//! Error types for the Paydesk domain model

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for domain type parsing
pub type Result<T> = std::result::Result<T, TypesError>;

/// Errors produced when converting raw input into domain types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    // ========================================================================
    // Enumeration Errors
    // ========================================================================

    #[error("Unknown transaction status: {0}")]
    UnknownStatus(String),

    #[error("Unknown transaction kind: {0}")]
    UnknownKind(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    // ========================================================================
    // Value Errors
    // ========================================================================

    /// Currency codes are three upper-case ASCII letters
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

/// One violated input rule, reported against a camelCase field name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
