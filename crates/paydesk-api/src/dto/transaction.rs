//! Payment and transfer DTOs

use chrono::{DateTime, Utc};
use paydesk_lifecycle::{PaymentFields, SwiftDirectory, TransferFields};
use paydesk_types::TransactionRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::common::AmountInput;

// =============================================================================
// Creation
// =============================================================================

/// Payment request.
///
/// Missing fields deserialize as empty and surface as validation errors.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Decimal text or number, greater than 0 and at most 1000000
    #[schema(value_type = String, example = "500.25")]
    pub amount: AmountInput,
    /// ISO-4217 code, e.g. ZAR
    pub currency: String,
    /// Payment provider, e.g. Western Union
    pub provider: String,
    /// The paying account; must be the caller's own
    pub account_number: String,
}

impl From<CreatePaymentRequest> for PaymentFields {
    fn from(request: CreatePaymentRequest) -> Self {
        Self {
            amount: request.amount.into_text(),
            currency: request.currency,
            provider: request.provider,
            account_number: request.account_number,
        }
    }
}

/// Transfer request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateTransferRequest {
    #[schema(value_type = String, example = "500.25")]
    pub amount: AmountInput,
    pub currency: String,
    pub beneficiary_name: String,
    pub beneficiary_account_number: String,
    /// Must match the directory entry for `swiftCode`
    pub bank_name: String,
    /// 8 or 11 letters and digits
    pub swift_code: String,
    pub reference: Option<String>,
    /// Payment this transfer completes
    pub linked_payment_id: Option<String>,
}

impl From<CreateTransferRequest> for TransferFields {
    fn from(request: CreateTransferRequest) -> Self {
        Self {
            amount: request.amount.into_text(),
            currency: request.currency,
            beneficiary_name: request.beneficiary_name,
            beneficiary_account_number: request.beneficiary_account_number,
            bank_name: request.bank_name,
            swift_code: request.swift_code,
            reference: request.reference,
            linked_payment_id: request.linked_payment_id,
        }
    }
}

// =============================================================================
// Review
// =============================================================================

/// Status change request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TransitionRequest {
    /// Target status: pending, approved, rejected or submitted
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

/// Administrative override request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OverrideRequest {
    /// rejected or pending
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    /// Recorded in the audit log, 2-200 characters
    #[validate(length(min = 2, max = 200, message = "Reason must be 2-200 characters"))]
    pub reason: String,
}

/// Listing filter
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct StatusQuery {
    /// Defaults to pending
    pub status: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// A payment or transfer as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub owner_account_id: String,
    /// Decimal as text
    pub amount: String,
    pub currency: String,
    /// payment or transfer
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
    /// Bank the directory knows under `swiftCode`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_transaction_id: Option<String>,
    /// initialized, pending, approved, rejected or submitted
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionResponse {
    pub fn from_record(record: TransactionRecord, directory: &SwiftDirectory) -> Self {
        let directory_bank_name = record
            .swift_code
            .as_deref()
            .and_then(|code| directory.lookup_by_swift(code))
            .map(String::from);

        Self {
            id: record.id.to_string(),
            owner_account_id: record.owner_account_id.to_string(),
            amount: record.amount.to_string(),
            currency: record.currency.to_string(),
            kind: record.kind.as_str().to_string(),
            provider: record.provider,
            beneficiary_name: record.beneficiary_name,
            beneficiary_account_number: record.beneficiary_account_number,
            bank_name: record.bank_name,
            swift_code: record.swift_code,
            directory_bank_name,
            reference: record.reference,
            linked_transaction_id: record.linked_transaction_id.map(|id| id.to_string()),
            status: record.status.as_str().to_string(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn list(records: Vec<TransactionRecord>, directory: &SwiftDirectory) -> Vec<Self> {
        records
            .into_iter()
            .map(|record| Self::from_record(record, directory))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paydesk_types::{AccountId, CurrencyCode, TransactionStatus};
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_request_defaults_missing_fields() {
        let request: CreatePaymentRequest = serde_json::from_str(r#"{"amount": 10}"#).unwrap();
        let fields = PaymentFields::from(request);
        assert_eq!(fields.amount, "10");
        assert_eq!(fields.currency, "");
    }

    #[test]
    fn test_response_resolves_directory_name() {
        let mut record = TransactionRecord::payment(
            AccountId::new(),
            dec!(500.25),
            CurrencyCode::parse("ZAR").unwrap(),
            "PayPal".to_string(),
            Utc::now(),
        );
        record.swift_code = Some("NEDSZAJJXXX".to_string());
        record.status = TransactionStatus::Pending;

        let response = TransactionResponse::from_record(record, &SwiftDirectory::new());
        assert_eq!(response.directory_bank_name.as_deref(), Some("Nedbank Limited"));
        assert_eq!(response.amount, "500.25");
        assert_eq!(response.status, "pending");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["directoryBankName"], "Nedbank Limited");
        assert!(json.get("beneficiaryName").is_none());
    }
}
