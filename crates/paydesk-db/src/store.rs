//! Storage traits
//!
//! Business logic only ever talks to [`AccountStore`] and
//! [`TransactionStore`]; the PostgreSQL repositories and the in-memory store
//! are interchangeable behind them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paydesk_types::{
    Account, AccountId, NewAccount, TransactionId, TransactionRecord, TransactionStatus,
};

use crate::DbResult;

/// Outcome of a compare-and-set status update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The record held the expected status and now holds the new one
    Applied(TransactionRecord),
    /// The record exists but no longer holds the expected status
    Stale(TransactionRecord),
    /// No record with that id
    Missing,
}

/// Account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: AccountId) -> DbResult<Option<Account>>;

    async fn find_by_account_number(&self, account_number: &str) -> DbResult<Option<Account>>;

    /// Fails with `DbError::Duplicate` when the account number is taken
    async fn create(&self, account: NewAccount) -> DbResult<Account>;
}

/// Transaction record persistence
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, record: TransactionRecord) -> DbResult<TransactionRecord>;

    async fn find_by_id(&self, id: TransactionId) -> DbResult<Option<TransactionRecord>>;

    /// Records owned by `owner`, newest first
    async fn find_by_owner(&self, owner: AccountId) -> DbResult<Vec<TransactionRecord>>;

    /// Records currently in `status`, newest first
    async fn find_by_status(&self, status: TransactionStatus) -> DbResult<Vec<TransactionRecord>>;

    /// Atomically move a record from `expected` to `next`, stamping `updated_at`
    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        next: TransactionStatus,
        at: DateTime<Utc>,
    ) -> DbResult<StatusUpdate>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: TransactionId) -> DbResult<bool>;

    /// Cheap connectivity probe for readiness checks
    async fn ping(&self) -> DbResult<()>;
}

/// The pair of stores a running service works against
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub transactions: Arc<dyn TransactionStore>,
}

impl Stores {
    pub fn new(accounts: Arc<dyn AccountStore>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            accounts,
            transactions,
        }
    }

    /// Both stores backed by one in-memory instance
    #[cfg(any(test, feature = "mock"))]
    pub fn in_memory() -> Self {
        let store = Arc::new(crate::memory::MemoryStore::new());
        Self {
            accounts: store.clone(),
            transactions: store,
        }
    }
}
