//! Authentication error types
//!
//! Errors are safe for external exposure: every credential failure collapses
//! into [`AuthError::Unauthenticated`] with one fixed message, and internal
//! variants only ever show a generic client message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use paydesk_db::DbError;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // Credential Errors
    // =========================================================================
    /// Missing, malformed, forged or expired bearer token
    #[error("Authentication required")]
    Unauthenticated,

    /// Login data did not match a stored account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password does not meet requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    /// Password hashing failed
    #[error("Password hashing failed")]
    PasswordHashingFailed,

    // =========================================================================
    // Account Errors
    // =========================================================================
    /// Token verified but its subject no longer exists
    #[error("Account not found")]
    AccountNotFound,

    #[error("An account with this account number already exists")]
    AccountExists,

    /// Authenticated, but the role may not perform the operation
    #[error("Insufficient permissions")]
    Forbidden,

    // =========================================================================
    // Rate Limiting Errors
    // =========================================================================
    #[error("Rate limit exceeded, try again in {retry_after} seconds")]
    RateLimitExceeded {
        /// Seconds until the oldest counted request leaves the window
        retry_after: u64,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not be exposed to clients)
    #[error("Internal error")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::WeakPassword(_) => 400,
            Self::Unauthenticated | Self::InvalidCredentials => 401,
            Self::Forbidden => 403,
            Self::AccountNotFound => 404,
            Self::AccountExists => 409,
            Self::RateLimitExceeded { .. } => 429,
            Self::PasswordHashingFailed
            | Self::Database(_)
            | Self::Config(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Get an error code for the client (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::WeakPassword(_) => "VALIDATION_ERROR",
            Self::AccountNotFound => "NOT_FOUND",
            Self::AccountExists => "ACCOUNT_EXISTS",
            Self::Forbidden => "FORBIDDEN",
            Self::RateLimitExceeded { .. } => "RATE_LIMITED",
            Self::PasswordHashingFailed
            | Self::Database(_)
            | Self::Config(_)
            | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Get safe message for client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Config(_) | Self::PasswordHashingFailed => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Create a rate limit error with retry-after duration
    pub fn rate_limited(duration: std::time::Duration) -> Self {
        // Round up so clients never retry a moment too early
        let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
        Self::RateLimitExceeded {
            retry_after: secs.max(1),
        }
    }
}

/// Error response for API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub code: String,
    /// Error message (human-readable)
    pub message: String,
    /// Retry-after in seconds (for rate limiting)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl From<&AuthError> for ErrorResponse {
    fn from(error: &AuthError) -> Self {
        let retry_after = match error {
            AuthError::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        };

        Self {
            code: error.error_code().to_string(),
            message: error.client_message(),
            retry_after,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        // Signature, encoding and claim failures are deliberately indistinguishable
        Self::Unauthenticated
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate(_) => Self::AccountExists,
            other => Self::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::Unauthenticated.status_code(), 401);
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::Forbidden.status_code(), 403);
        assert_eq!(AuthError::AccountNotFound.status_code(), 404);
        assert_eq!(AuthError::AccountExists.status_code(), 409);
        assert_eq!(AuthError::RateLimitExceeded { retry_after: 60 }.status_code(), 429);
        assert_eq!(AuthError::Database("test".to_string()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::Unauthenticated.error_code(), "UNAUTHENTICATED");
        assert_eq!(
            AuthError::Database("secret info".to_string()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_client_message_hides_internal_details() {
        let err = AuthError::Database("connection string with password".to_string());
        assert!(!err.client_message().contains("password"));
        assert_eq!(err.client_message(), "An internal error occurred");
    }

    #[test]
    fn test_rate_limited_rounds_up() {
        let err = AuthError::rate_limited(std::time::Duration::from_millis(1500));
        assert!(matches!(err, AuthError::RateLimitExceeded { retry_after: 2 }));

        let err = AuthError::rate_limited(std::time::Duration::ZERO);
        assert!(matches!(err, AuthError::RateLimitExceeded { retry_after: 1 }));
    }

    #[test]
    fn test_error_response() {
        let err = AuthError::RateLimitExceeded { retry_after: 60 };
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "RATE_LIMITED");
        assert_eq!(response.retry_after, Some(60));

        let json = serde_json::to_value(ErrorResponse::from(&AuthError::Unauthenticated)).unwrap();
        assert!(json.get("retryAfter").is_none());
    }

    #[test]
    fn test_duplicate_maps_to_account_exists() {
        let err = AuthError::from(DbError::Duplicate("Account number taken".to_string()));
        assert!(matches!(err, AuthError::AccountExists));
    }
}
