//! Paydesk Authentication Layer
//!
//! - **JWT**: HS256 bearer tokens with expiry checked against an injected clock
//! - **Credentials**: Argon2id hashing with random salt and optional pepper
//! - **IdentityGate**: bearer header to [`paydesk_types::Actor`], re-resolving
//!   the account on every request
//! - **AbuseGuard**: sliding-window limits per client and bucket
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Request → AbuseGuard → AuthLayer → Handler                 │
//! │                            │                                │
//! │                            ▼                                │
//! │                      IdentityGate                           │
//! │                     │            │                          │
//! │                     ▼            ▼                          │
//! │               JwtService    AccountStore                    │
//! │                     │            │                          │
//! │                     └─────┬──────┘                          │
//! │                           ▼                                 │
//! │                         Actor                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod rate_limit;
pub mod types;

pub use config::{AuthConfig, BucketLimit, JwtConfig, PasswordConfig, RateLimitConfig};
pub use error::{AuthError, AuthResult, ErrorResponse};
pub use gate::IdentityGate;
pub use jwt::JwtService;
pub use middleware::{auth_error_response, AuthLayer, AuthMiddleware, RequireAuth, RequireEmployee};
pub use password::PasswordService;
pub use rate_limit::{extract_client_ip, AbuseGuard, RateBucket};
pub use types::*;

use std::sync::{Arc, OnceLock};

use paydesk_db::AccountStore;
use paydesk_types::{Actor, Clock, NewAccount, Role};

/// Authentication facade used by the HTTP layer and the server
#[derive(Clone)]
pub struct AuthService {
    pub jwt: Arc<JwtService>,
    pub password: PasswordService,
    pub gate: Arc<IdentityGate>,
    pub guard: AbuseGuard,
    accounts: Arc<dyn AccountStore>,
    config: AuthConfig,
    /// Verified against when no real credential exists, so unknown accounts
    /// cost the same argon2 pass as known ones
    dummy_hash: Arc<OnceLock<String>>,
}

const DUMMY_PASSWORD: &str = "UnusedCredential0123456789";

impl AuthService {
    pub fn new(config: AuthConfig, accounts: Arc<dyn AccountStore>, clock: Arc<dyn Clock>) -> Self {
        let jwt = Arc::new(JwtService::new(config.jwt.clone(), clock));
        let password = PasswordService::new(config.password.clone());
        let gate = Arc::new(IdentityGate::new(jwt.clone(), accounts.clone()));
        let guard = AbuseGuard::new(config.rate_limit.clone());

        Self {
            jwt,
            password,
            gate,
            guard,
            accounts,
            config,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create an auth layer for the Axum router
    pub fn layer(&self) -> AuthLayer {
        AuthLayer::new(self.gate.clone())
    }

    /// Store a new account with a hashed credential
    pub async fn provision(&self, registration: &Registration, role: Role) -> AuthResult<Actor> {
        let credential_hash = self.password.hash_password(&registration.password)?;

        let account = self
            .accounts
            .create(NewAccount {
                display_name: registration.full_name.trim().to_string(),
                id_number: registration.id_number.clone(),
                account_number: registration.account_number.clone(),
                credential_hash,
                role,
            })
            .await?;

        Ok(Actor::from(&account))
    }

    /// Self-service registration; always yields a customer
    pub async fn register(&self, registration: Registration) -> AuthResult<Session> {
        let actor = self.provision(&registration, Role::Customer).await?;
        tracing::info!(actor_id = %actor.id, "Account registered");
        self.session_for(actor).await
    }

    /// Check account number, name and password together.
    ///
    /// Unknown account, wrong name and wrong password are the same error.
    pub async fn login(&self, account_number: &str, full_name: &str, password: &str) -> AuthResult<Session> {
        let account = match self.accounts.find_by_account_number(account_number.trim()).await? {
            Some(account) => account,
            None => {
                self.verify_against_dummy(password);
                tracing::warn!("Login failed: unknown account");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let name_matches = account
            .display_name
            .trim()
            .eq_ignore_ascii_case(full_name.trim());
        let password_matches = self.password.verify_password(password, &account.credential_hash)?;

        if !name_matches || !password_matches {
            tracing::warn!(actor_id = %account.id, "Login failed: credentials mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(actor_id = %account.id, "Login succeeded");
        Ok(Session {
            token: self.jwt.issue(&account)?,
            actor: Actor::from(&account),
        })
    }

    fn verify_against_dummy(&self, password: &str) {
        let hash = self.dummy_hash.get_or_init(|| {
            self.password.hash_password(DUMMY_PASSWORD).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to prepare dummy credential");
                String::new()
            })
        });
        if !hash.is_empty() {
            let _ = self.password.verify_password(password, hash);
        }
    }

    async fn session_for(&self, actor: Actor) -> AuthResult<Session> {
        let account = self
            .accounts
            .find_by_id(actor.id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(Session {
            token: self.jwt.issue(&account)?,
            actor,
        })
    }
}
