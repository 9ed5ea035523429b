//! Identity gate
//!
//! Turns the raw `Authorization` header into an [`Actor`]. The account is
//! looked up fresh on every call, so an edited or removed account loses its
//! privileges immediately.

use std::sync::Arc;

use paydesk_db::AccountStore;
use paydesk_types::{AccountId, Actor};

use crate::error::{AuthError, AuthResult};
use crate::jwt::JwtService;

const BEARER_PREFIX: &str = "Bearer ";

/// Verifies bearer credentials and resolves them to actors
#[derive(Clone)]
pub struct IdentityGate {
    jwt: Arc<JwtService>,
    accounts: Arc<dyn AccountStore>,
}

impl IdentityGate {
    pub fn new(jwt: Arc<JwtService>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { jwt, accounts }
    }

    /// Resolve an `Authorization` header value to the calling actor.
    ///
    /// Absent header, missing `Bearer ` scheme, bad signature, malformed
    /// claims and expiry all fail with the same [`AuthError::Unauthenticated`].
    /// A valid token for an account that no longer exists fails with
    /// [`AuthError::AccountNotFound`].
    pub async fn authenticate(&self, authorization: Option<&str>) -> AuthResult<Actor> {
        let token = authorization
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        let claims = self.jwt.verify(token)?;
        let account_id = AccountId::parse(&claims.sub).map_err(|_| AuthError::Unauthenticated)?;

        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(Actor::from(&account))
    }
}
