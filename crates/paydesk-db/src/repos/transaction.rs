//! Transaction record repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paydesk_types::{AccountId, TransactionId, TransactionRecord, TransactionStatus};
use sqlx::PgPool;

use crate::{DbError, DbResult, DbTransaction, StatusUpdate, TransactionStore};

/// Transaction repository backed by the `transactions` table
#[derive(Debug, Clone)]
pub struct TransactionRepo {
    pool: PgPool,
}

impl TransactionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_rows(rows: Vec<DbTransaction>) -> DbResult<Vec<TransactionRecord>> {
        rows.into_iter().map(TransactionRecord::try_from).collect()
    }
}

#[async_trait]
impl TransactionStore for TransactionRepo {
    async fn create(&self, record: TransactionRecord) -> DbResult<TransactionRecord> {
        let row = sqlx::query_as::<_, DbTransaction>(
            r#"
            INSERT INTO transactions (
                id, owner_account_id, amount, currency, kind, provider,
                beneficiary_name, beneficiary_account_number, bank_name, swift_code,
                reference, linked_transaction_id, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(record.id.0)
        .bind(record.owner_account_id.0)
        .bind(record.amount)
        .bind(record.currency.as_str())
        .bind(record.kind.as_str())
        .bind(&record.provider)
        .bind(&record.beneficiary_name)
        .bind(&record.beneficiary_account_number)
        .bind(&record.bank_name)
        .bind(&record.swift_code)
        .bind(&record.reference)
        .bind(record.linked_transaction_id.map(|id| id.0))
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_foreign_key_violation() {
                    return DbError::Constraint(format!(
                        "Transaction {} references a missing row",
                        record.id
                    ));
                }
            }
            DbError::Query(e)
        })?;

        TransactionRecord::try_from(row)
    }

    async fn find_by_id(&self, id: TransactionId) -> DbResult<Option<TransactionRecord>> {
        let row = sqlx::query_as::<_, DbTransaction>("SELECT * FROM transactions WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TransactionRecord::try_from).transpose()
    }

    async fn find_by_owner(&self, owner: AccountId) -> DbResult<Vec<TransactionRecord>> {
        let rows = sqlx::query_as::<_, DbTransaction>(
            "SELECT * FROM transactions WHERE owner_account_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await?;

        Self::map_rows(rows)
    }

    async fn find_by_status(&self, status: TransactionStatus) -> DbResult<Vec<TransactionRecord>> {
        let rows = sqlx::query_as::<_, DbTransaction>(
            "SELECT * FROM transactions WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Self::map_rows(rows)
    }

    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        next: TransactionStatus,
        at: DateTime<Utc>,
    ) -> DbResult<StatusUpdate> {
        // The row lock taken by UPDATE serialises concurrent callers; the
        // loser re-evaluates the WHERE clause and matches nothing.
        let updated = sqlx::query_as::<_, DbTransaction>(
            r#"
            UPDATE transactions
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(StatusUpdate::Applied(TransactionRecord::try_from(row)?));
        }

        Ok(match self.find_by_id(id).await? {
            Some(current) => StatusUpdate::Stale(current),
            None => StatusUpdate::Missing,
        })
    }

    async fn delete(&self, id: TransactionId) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
