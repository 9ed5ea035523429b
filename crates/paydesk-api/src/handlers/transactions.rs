//! Payment and Transfer Handlers
//!
//! Creation by customers, listings, and the employee review actions. Role
//! rules live in the lifecycle; the employee extractors only make a
//! customer's request fail with 403 before its body is looked at.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use paydesk_auth::{RequireAuth, RequireEmployee};
use paydesk_types::{FieldViolation, TransactionStatus};

use crate::dto::{
    CreatePaymentRequest, CreateTransferRequest, OverrideRequest, StatusQuery, TransactionResponse,
    TransitionRequest,
};
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::extractors::{TransactionPath, ValidatedJson};
use crate::state::AppState;

type Created = (StatusCode, Json<TransactionResponse>);

fn parse_status(raw: &str) -> ApiResult<TransactionStatus> {
    raw.parse().map_err(|_| {
        ApiError::Validation(vec![FieldViolation::new(
            "status",
            format!("Unknown status: {}", raw.trim()),
        )])
    })
}

fn respond(state: &AppState, record: paydesk_types::TransactionRecord) -> Json<TransactionResponse> {
    Json(TransactionResponse::from_record(record, state.lifecycle.directory()))
}

// =============================================================================
// Creation
// =============================================================================

/// Create a payment
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "Payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded as initialized", body = TransactionResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a customer", body = ErrorResponse),
        (status = 429, description = "Too many payments", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(request) = payload?;
    let record = state.lifecycle.create_payment(&actor, request.into()).await?;
    Ok((StatusCode::CREATED, respond(&state, record)))
}

/// Create a SWIFT transfer
///
/// A bank name that does not match the SWIFT code still answers 201, with
/// the record in `rejected`.
#[utoipa::path(
    post,
    path = "/api/v1/payments/transfer",
    tag = "Payments",
    request_body = CreateTransferRequest,
    responses(
        (status = 201, description = "Transfer recorded as pending or auto-rejected", body = TransactionResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Not a customer, or linked payment of another account", body = ErrorResponse),
        (status = 404, description = "Linked payment not found", body = ErrorResponse),
        (status = 429, description = "Too many payments", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    payload: Result<Json<CreateTransferRequest>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(request) = payload?;
    let record = state.lifecycle.create_transfer(&actor, request.into()).await?;
    Ok((StatusCode::CREATED, respond(&state, record)))
}

// =============================================================================
// Listings
// =============================================================================

/// The caller's own transactions, newest first
#[utoipa::path(
    get,
    path = "/api/v1/payments/history",
    tag = "Payments",
    responses(
        (status = 200, description = "Own transactions", body = [TransactionResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn history(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let records = state.lifecycle.list_owned(&actor, &actor.account_number).await?;
    Ok(Json(TransactionResponse::list(records, state.lifecycle.directory())))
}

/// Transactions of one account; owner or employee
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account_number}/transactions",
    tag = "Payments",
    params(("account_number" = String, Path, description = "Account number")),
    responses(
        (status = 200, description = "Account transactions", body = [TransactionResponse]),
        (status = 403, description = "Another customer's account", body = ErrorResponse),
        (status = 404, description = "Unknown account", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn account_transactions(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    Path(account_number): Path<String>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let records = state.lifecycle.list_owned(&actor, &account_number).await?;
    Ok(Json(TransactionResponse::list(records, state.lifecycle.directory())))
}

/// Transactions in one status, newest first; employees only
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "Review",
    params(StatusQuery),
    responses(
        (status = 200, description = "Transactions in the status", body = [TransactionResponse]),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Not an employee", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_by_status(
    State(state): State<Arc<AppState>>,
    RequireEmployee(actor): RequireEmployee,
    query: Result<Query<StatusQuery>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let Query(query) = query?;
    let status = match query.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => TransactionStatus::Pending,
    };

    let records = state.lifecycle.list_by_status(&actor, status).await?;
    Ok(Json(TransactionResponse::list(records, state.lifecycle.directory())))
}

/// One transaction; owner or employee
#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    tag = "Payments",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "The transaction", body = TransactionResponse),
        (status = 403, description = "Another customer's transaction", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    RequireAuth(actor): RequireAuth,
    TransactionPath(id): TransactionPath,
) -> ApiResult<Json<TransactionResponse>> {
    let record = state.lifecycle.get_record(&actor, id).await?;
    Ok(respond(&state, record))
}

// =============================================================================
// Review
// =============================================================================

/// Move a transaction along the transition table
#[utoipa::path(
    patch,
    path = "/api/v1/payments/{id}/status",
    tag = "Review",
    params(("id" = String, Path, description = "Transaction id")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Status changed, or already held", body = TransactionResponse),
        (status = 403, description = "Not an employee", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Invalid transition or concurrent change", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn transition(
    State(state): State<Arc<AppState>>,
    RequireEmployee(actor): RequireEmployee,
    TransactionPath(id): TransactionPath,
    ValidatedJson(request): ValidatedJson<TransitionRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    let target = parse_status(&request.status)?;
    let record = state.lifecycle.transition(&actor, id, target).await?;
    Ok(respond(&state, record))
}

/// Approve a pending transaction
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/approve",
    tag = "Review",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Approved", body = TransactionResponse),
        (status = 409, description = "Not pending", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn approve(
    State(state): State<Arc<AppState>>,
    RequireEmployee(actor): RequireEmployee,
    TransactionPath(id): TransactionPath,
) -> ApiResult<Json<TransactionResponse>> {
    let record = state.lifecycle.approve(&actor, id).await?;
    Ok(respond(&state, record))
}

/// Reject a pending transaction
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/reject",
    tag = "Review",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Rejected", body = TransactionResponse),
        (status = 409, description = "Not pending", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn reject(
    State(state): State<Arc<AppState>>,
    RequireEmployee(actor): RequireEmployee,
    TransactionPath(id): TransactionPath,
) -> ApiResult<Json<TransactionResponse>> {
    let record = state.lifecycle.reject(&actor, id).await?;
    Ok(respond(&state, record))
}

/// Submit a pending transaction to SWIFT
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/submit",
    tag = "Review",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Submitted", body = TransactionResponse),
        (status = 409, description = "Not pending", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    RequireEmployee(actor): RequireEmployee,
    TransactionPath(id): TransactionPath,
) -> ApiResult<Json<TransactionResponse>> {
    let record = state.lifecycle.submit(&actor, id).await?;
    Ok(respond(&state, record))
}

/// Administrative override to `rejected` or back to `pending`
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/override",
    tag = "Review",
    params(("id" = String, Path, description = "Transaction id")),
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Status overridden", body = TransactionResponse),
        (status = 400, description = "Invalid target or reason", body = ErrorResponse),
        (status = 409, description = "Not allowed from the current status", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn override_status(
    State(state): State<Arc<AppState>>,
    RequireEmployee(actor): RequireEmployee,
    TransactionPath(id): TransactionPath,
    ValidatedJson(request): ValidatedJson<OverrideRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    let target = parse_status(&request.status)?;
    let record = state
        .lifecycle
        .override_status(&actor, id, target, &request.reason)
        .await?;
    Ok(respond(&state, record))
}

/// Delete a transaction permanently
#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    tag = "Review",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an employee", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    RequireEmployee(actor): RequireEmployee,
    TransactionPath(id): TransactionPath,
) -> ApiResult<StatusCode> {
    state.lifecycle.delete_record(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
