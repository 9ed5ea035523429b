//! API Routes
//!
//! Route definitions for all API endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Create API v1 routes
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/payments", payment_routes())
        .route(
            "/accounts/:account_number/transactions",
            get(handlers::transactions::account_transactions),
        )
}

/// Authentication routes
fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

/// Payment, transfer and review routes
fn payment_routes() -> Router<Arc<AppState>> {
    use handlers::transactions as tx;

    Router::new()
        .route("/", post(tx::create_payment).get(tx::list_by_status))
        .route("/transfer", post(tx::create_transfer))
        .route("/history", get(tx::history))
        .route("/:id", get(tx::get_record).delete(tx::delete_record))
        .route("/:id/status", patch(tx::transition))
        .route("/:id/approve", post(tx::approve))
        .route("/:id/reject", post(tx::reject))
        .route("/:id/submit", post(tx::submit))
        .route("/:id/override", post(tx::override_status))
}

/// Create Swagger UI routes
pub fn swagger_routes() -> Router<Arc<AppState>> {
    use crate::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
