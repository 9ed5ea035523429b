//! Token types shared by the JWT service, the gate and the HTTP layer

use chrono::{DateTime, Utc};
use paydesk_types::{Actor, Role};
use serde::{Deserialize, Serialize};

/// Claims carried by every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account id
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
    /// Random token id
    pub jti: String,
}

/// A freshly signed bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn bearer(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }
}

/// Result of a successful register or login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: IssuedToken,
    pub actor: Actor,
}

/// Registration input after field validation
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub id_number: String,
    pub account_number: String,
    pub password: String,
}
