//! JWT Token Service
//!
//! HS256 tokens whose expiry is checked against the injected [`Clock`]
//! rather than the library's own reading of the system time.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use paydesk_types::{Account, Clock};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{IssuedToken, TokenClaims};

/// JWT service for issuing and verifying bearer tokens
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    pub fn new(config: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
            clock,
        }
    }

    /// Sign a token for `account`
    pub fn issue(&self, account: &Account) -> AuthResult<IssuedToken> {
        let now = self.clock.now();
        let expires_at = now
            + Duration::from_std(self.config.token_lifetime)
                .map_err(|e| AuthError::Config(e.to_string()))?;

        let claims = TokenClaims {
            sub: account.id.to_string(),
            role: account.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to encode token: {}", e)))?;

        Ok(IssuedToken::bearer(token, timestamp_to_datetime(claims.exp)?))
    }

    /// Check signature, issuer, audience and time window.
    ///
    /// Every failure is reported as [`AuthError::Unauthenticated`].
    pub fn verify(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)?.claims;

        let now = self.clock.now().timestamp();
        if now >= claims.exp || now < claims.nbf {
            return Err(AuthError::Unauthenticated);
        }

        Ok(claims)
    }
}

fn timestamp_to_datetime(secs: i64) -> AuthResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AuthError::Internal(format!("Timestamp out of range: {}", secs)))
}
