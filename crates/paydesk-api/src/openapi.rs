//! OpenAPI Documentation
//!
//! Generated OpenAPI 3.0 document for the Paydesk API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::dto;
use crate::error::{ErrorResponse, FieldError};
use crate::handlers;

/// Paydesk API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Paydesk API",
        description = "Customer payments and SWIFT transfers with employee review.",
        version = "1.0.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    paths(
        // Health
        handlers::health::health_check,
        handlers::health::readiness_check,
        // Auth
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        // Payments
        handlers::transactions::create_payment,
        handlers::transactions::create_transfer,
        handlers::transactions::history,
        handlers::transactions::account_transactions,
        handlers::transactions::get_record,
        // Review
        handlers::transactions::list_by_status,
        handlers::transactions::transition,
        handlers::transactions::approve,
        handlers::transactions::reject,
        handlers::transactions::submit,
        handlers::transactions::override_status,
        handlers::transactions::delete_record,
    ),
    components(
        schemas(
            // Common
            ErrorResponse,
            FieldError,
            dto::HealthResponse,
            dto::ReadinessResponse,
            dto::ComponentStatus,
            // Auth
            dto::RegisterRequest,
            dto::LoginRequest,
            dto::ActorResponse,
            dto::SessionResponse,
            // Payments
            dto::CreatePaymentRequest,
            dto::CreateTransferRequest,
            dto::TransitionRequest,
            dto::OverrideRequest,
            dto::TransactionResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Authentication", description = "Registration, login and the current actor"),
        (name = "Payments", description = "Customer payments, transfers and listings"),
        (name = "Review", description = "Employee review of pending transactions")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier
pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Get the OpenAPI JSON document
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_json()
}
