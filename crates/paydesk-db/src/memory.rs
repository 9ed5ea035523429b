//! In-memory store for tests and dev mode
//!
//! Mirrors the PostgreSQL constraints that matter to callers: unique account
//! numbers, foreign keys on record creation, `ON DELETE SET NULL` for linked
//! records, and compare-and-set status updates under a single write lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use paydesk_types::{
    Account, AccountId, NewAccount, TransactionId, TransactionRecord, TransactionStatus,
};

use crate::{AccountStore, DbError, DbResult, StatusUpdate, TransactionStore};

/// Both stores in one process-local map set
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    transactions: RwLock<HashMap<TransactionId, TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed account, bypassing id generation
    pub fn insert_account(&self, account: Account) -> DbResult<Account> {
        let mut accounts = self.accounts.write();
        if accounts
            .values()
            .any(|a| a.account_number == account.account_number)
        {
            return Err(DbError::Duplicate(format!(
                "Account number {} already exists",
                account.account_number
            )));
        }
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.read().len()
    }

    fn newest_first(mut records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: AccountId) -> DbResult<Option<Account>> {
        Ok(self.accounts.read().get(&id).cloned())
    }

    async fn find_by_account_number(&self, account_number: &str) -> DbResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .values()
            .find(|a| a.account_number == account_number)
            .cloned())
    }

    async fn create(&self, account: NewAccount) -> DbResult<Account> {
        self.insert_account(Account {
            id: AccountId::new(),
            display_name: account.display_name,
            id_number: account.id_number,
            account_number: account.account_number,
            credential_hash: account.credential_hash,
            role: account.role,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create(&self, record: TransactionRecord) -> DbResult<TransactionRecord> {
        if !self.accounts.read().contains_key(&record.owner_account_id) {
            return Err(DbError::Constraint(format!(
                "Transaction {} references a missing row",
                record.id
            )));
        }

        let mut transactions = self.transactions.write();
        if let Some(linked) = record.linked_transaction_id {
            if !transactions.contains_key(&linked) {
                return Err(DbError::Constraint(format!(
                    "Transaction {} references a missing row",
                    record.id
                )));
            }
        }
        if transactions.contains_key(&record.id) {
            return Err(DbError::Duplicate(format!("Transaction {} already exists", record.id)));
        }
        transactions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: TransactionId) -> DbResult<Option<TransactionRecord>> {
        Ok(self.transactions.read().get(&id).cloned())
    }

    async fn find_by_owner(&self, owner: AccountId) -> DbResult<Vec<TransactionRecord>> {
        let records = self
            .transactions
            .read()
            .values()
            .filter(|r| r.owner_account_id == owner)
            .cloned()
            .collect();
        Ok(Self::newest_first(records))
    }

    async fn find_by_status(&self, status: TransactionStatus) -> DbResult<Vec<TransactionRecord>> {
        let records = self
            .transactions
            .read()
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        Ok(Self::newest_first(records))
    }

    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        next: TransactionStatus,
        at: DateTime<Utc>,
    ) -> DbResult<StatusUpdate> {
        let mut transactions = self.transactions.write();
        let Some(record) = transactions.get_mut(&id) else {
            return Ok(StatusUpdate::Missing);
        };

        if record.status != expected {
            return Ok(StatusUpdate::Stale(record.clone()));
        }

        record.status = next;
        record.updated_at = at;
        Ok(StatusUpdate::Applied(record.clone()))
    }

    async fn delete(&self, id: TransactionId) -> DbResult<bool> {
        let mut transactions = self.transactions.write();
        if transactions.remove(&id).is_none() {
            return Ok(false);
        }
        for record in transactions.values_mut() {
            if record.linked_transaction_id == Some(id) {
                record.linked_transaction_id = None;
            }
        }
        Ok(true)
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use paydesk_types::{CurrencyCode, Role};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn new_account(number: &str) -> NewAccount {
        NewAccount {
            display_name: "Lerato Dlamini".to_string(),
            id_number: "1234567890124".to_string(),
            account_number: number.to_string(),
            credential_hash: "hash".to_string(),
            role: Role::Customer,
        }
    }

    fn payment(owner: AccountId, at: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord::payment(
            owner,
            dec!(250),
            CurrencyCode::parse("ZAR").unwrap(),
            "Western Union".to_string(),
            at,
        )
    }

    #[tokio::test]
    async fn test_duplicate_account_number() {
        let store = MemoryStore::new();
        AccountStore::create(&store, new_account("200000000009")).await.unwrap();
        let err = AccountStore::create(&store, new_account("200000000009"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_create_requires_owner() {
        let store = MemoryStore::new();
        let err = TransactionStore::create(&store, payment(AccountId::new(), Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_listings_are_newest_first() {
        let store = MemoryStore::new();
        let owner = AccountStore::create(&store, new_account("200000000010")).await.unwrap();
        let base = Utc::now();

        for minutes in [5, 1, 9] {
            TransactionStore::create(&store, payment(owner.id, base + Duration::minutes(minutes)))
                .await
                .unwrap();
        }

        let owned = store.find_by_owner(owner.id).await.unwrap();
        let times: Vec<_> = owned.iter().map(|r| r.created_at).collect();
        assert_eq!(
            times,
            vec![
                base + Duration::minutes(9),
                base + Duration::minutes(5),
                base + Duration::minutes(1)
            ]
        );

        let initialized = store
            .find_by_status(TransactionStatus::Initialized)
            .await
            .unwrap();
        assert_eq!(initialized.len(), 3);
        assert!(store.find_by_status(TransactionStatus::Pending).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_compare_and_set() {
        let store = MemoryStore::new();
        let owner = AccountStore::create(&store, new_account("200000000011")).await.unwrap();
        let record = TransactionStore::create(&store, payment(owner.id, Utc::now()))
            .await
            .unwrap();
        let later = Utc::now() + Duration::seconds(30);

        let applied = store
            .update_status(record.id, TransactionStatus::Initialized, TransactionStatus::Pending, later)
            .await
            .unwrap();
        match applied {
            StatusUpdate::Applied(r) => {
                assert_eq!(r.status, TransactionStatus::Pending);
                assert_eq!(r.updated_at, later);
            }
            other => panic!("expected Applied, got {other:?}"),
        }

        let stale = store
            .update_status(record.id, TransactionStatus::Initialized, TransactionStatus::Pending, later)
            .await
            .unwrap();
        assert!(matches!(stale, StatusUpdate::Stale(r) if r.status == TransactionStatus::Pending));

        let missing = store
            .update_status(TransactionId::new(), TransactionStatus::Pending, TransactionStatus::Approved, later)
            .await
            .unwrap();
        assert_eq!(missing, StatusUpdate::Missing);
    }

    #[tokio::test]
    async fn test_concurrent_updates_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let owner = AccountStore::create(store.as_ref(), new_account("200000000012"))
            .await
            .unwrap();
        let record = TransactionStore::create(store.as_ref(), payment(owner.id, Utc::now()))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_status(
                        record.id,
                        TransactionStatus::Initialized,
                        TransactionStatus::Pending,
                        Utc::now(),
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), StatusUpdate::Applied(_)) {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn test_delete_clears_links() {
        let store = MemoryStore::new();
        let owner = AccountStore::create(&store, new_account("200000000013")).await.unwrap();
        let first = TransactionStore::create(&store, payment(owner.id, Utc::now()))
            .await
            .unwrap();
        let mut linked = payment(owner.id, Utc::now());
        linked.linked_transaction_id = Some(first.id);
        let linked = TransactionStore::create(&store, linked).await.unwrap();

        assert!(store.delete(first.id).await.unwrap());
        assert!(!store.delete(first.id).await.unwrap());

        let reloaded = TransactionStore::find_by_id(&store, linked.id).await.unwrap().unwrap();
        assert_eq!(reloaded.linked_transaction_id, None);
        assert_eq!(store.transaction_count(), 1);
    }
}
