//! Application state shared across handlers

use std::sync::Arc;

use paydesk_auth::{AuthConfig, AuthService};
use paydesk_db::Stores;
use paydesk_lifecycle::PaymentLifecycle;
use paydesk_types::Clock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Backing stores, also used for readiness probes
    pub stores: Stores,
    /// Authentication, identity gate and abuse guard
    pub auth: Arc<AuthService>,
    /// The payment state machine
    pub lifecycle: Arc<PaymentLifecycle>,
}

impl AppState {
    pub fn new(stores: Stores, auth_config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let auth = Arc::new(AuthService::new(
            auth_config,
            stores.accounts.clone(),
            clock.clone(),
        ));
        let lifecycle = Arc::new(PaymentLifecycle::new(
            stores.accounts.clone(),
            stores.transactions.clone(),
            clock,
        ));

        Self {
            stores,
            auth,
            lifecycle,
        }
    }
}
