//! Database models - mapped from PostgreSQL tables

use chrono::{DateTime, Utc};
use paydesk_types::{
    Account, AccountId, CurrencyCode, TransactionId, TransactionRecord,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::DbError;

// ============================================================================
// Account Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAccount {
    pub id: Uuid,
    pub display_name: String,
    pub id_number: String,
    pub account_number: String,
    pub credential_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbAccount> for Account {
    type Error = DbError;

    fn try_from(row: DbAccount) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId::from(row.id),
            display_name: row.display_name,
            id_number: row.id_number,
            account_number: row.account_number,
            credential_hash: row.credential_hash,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}

// ============================================================================
// Transaction Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTransaction {
    pub id: Uuid,
    pub owner_account_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub kind: String,
    pub provider: Option<String>,
    pub beneficiary_name: Option<String>,
    pub beneficiary_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub swift_code: Option<String>,
    pub reference: Option<String>,
    pub linked_transaction_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbTransaction> for TransactionRecord {
    type Error = DbError;

    fn try_from(row: DbTransaction) -> Result<Self, Self::Error> {
        Ok(TransactionRecord {
            id: TransactionId::from(row.id),
            owner_account_id: AccountId::from(row.owner_account_id),
            amount: row.amount,
            // CHAR(3) comes back space padded if it was ever shorter
            currency: CurrencyCode::parse(row.currency.trim_end())?,
            kind: row.kind.parse()?,
            provider: row.provider,
            beneficiary_name: row.beneficiary_name,
            beneficiary_account_number: row.beneficiary_account_number,
            bank_name: row.bank_name,
            swift_code: row.swift_code,
            reference: row.reference,
            linked_transaction_id: row.linked_transaction_id.map(TransactionId::from),
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
