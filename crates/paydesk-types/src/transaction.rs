//! Transaction records and the status transition graph
//!
//! A record is created once and afterwards only its `status` (and
//! `updated_at`) ever change. Which status changes are legal is decided by a
//! single declarative table, [`TRANSITIONS`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::currency::CurrencyCode;
use crate::error::TypesError;
use crate::identity::{AccountId, TransactionId};

/// Kind of transaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// A customer payment through a provider
    Payment,
    /// A SWIFT transfer to a beneficiary bank
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(Self::Payment),
            "transfer" => Ok(Self::Transfer),
            other => Err(TypesError::UnknownKind(other.to_string())),
        }
    }
}

/// Status of a transaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Payment captured, waiting for its transfer details
    Initialized,
    /// Waiting for employee review
    Pending,
    /// Accepted by an employee
    Approved,
    /// Refused by an employee or by auto-verification
    Rejected,
    /// Handed over to SWIFT
    Submitted,
}

/// Every legal `(from, to)` edge. Anything not listed is an invalid transition.
pub const TRANSITIONS: &[(TransactionStatus, TransactionStatus)] = &[
    (TransactionStatus::Initialized, TransactionStatus::Pending),
    (TransactionStatus::Pending, TransactionStatus::Approved),
    (TransactionStatus::Pending, TransactionStatus::Rejected),
    (TransactionStatus::Pending, TransactionStatus::Submitted),
];

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 5] = [
        Self::Initialized,
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Submitted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Submitted => "submitted",
        }
    }

    /// No further regular transitions leave a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Submitted)
    }

    /// Whether `self -> next` is an edge of the transition graph
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        TRANSITIONS
            .iter()
            .any(|(from, to)| *from == *self && *to == next)
    }

    /// Targets reachable in one step from `self`
    pub fn successors(&self) -> impl Iterator<Item = TransactionStatus> + '_ {
        TRANSITIONS
            .iter()
            .filter(move |(from, _)| from == self)
            .map(|(_, to)| *to)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| TypesError::UnknownStatus(s.to_string()))
    }
}

/// A payment or transfer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub owner_account_id: AccountId,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary_account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_transaction_id: Option<TransactionId>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// New payment record, starting at `initialized`
    pub fn payment(
        owner: AccountId,
        amount: Decimal,
        currency: CurrencyCode,
        provider: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            owner_account_id: owner,
            amount,
            currency,
            kind: TransactionKind::Payment,
            provider: Some(provider),
            beneficiary_name: None,
            beneficiary_account_number: None,
            bank_name: None,
            swift_code: None,
            reference: None,
            linked_transaction_id: None,
            status: TransactionStatus::Initialized,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, account: AccountId) -> bool {
        self.owner_account_id == account
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
