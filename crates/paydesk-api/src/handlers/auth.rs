//! Authentication Handlers
//!
//! Registration, login and the current actor.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use paydesk_auth::RequireAuth;

use crate::dto::{ActorResponse, LoginRequest, RegisterRequest, SessionResponse};
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Customer self-registration
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 409, description = "Account number taken", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let Json(request) = payload?;
    let violations = request.violations(&state.auth.password);
    if !violations.is_empty() {
        return Err(ApiError::Validation(violations));
    }

    let session = state.auth.register(request.into_registration()).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Login with account number, full name and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .auth
        .login(&request.account_number, &request.full_name, &request.password)
        .await?;
    Ok(Json(session.into()))
}

/// The authenticated actor
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current actor", body = ActorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn me(RequireAuth(actor): RequireAuth) -> Json<ActorResponse> {
    Json(actor.into())
}
