//! Account repository

use async_trait::async_trait;
use paydesk_types::{Account, AccountId, NewAccount};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{AccountStore, DbAccount, DbError, DbResult};

/// Account repository backed by the `accounts` table
#[derive(Debug, Clone)]
pub struct AccountRepo {
    pool: PgPool,
}

impl AccountRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for AccountRepo {
    async fn find_by_id(&self, id: AccountId) -> DbResult<Option<Account>> {
        let row = sqlx::query_as::<_, DbAccount>("SELECT * FROM accounts WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_account_number(&self, account_number: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query_as::<_, DbAccount>(
            "SELECT * FROM accounts WHERE account_number = $1",
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn create(&self, account: NewAccount) -> DbResult<Account> {
        let row = sqlx::query_as::<_, DbAccount>(
            r#"
            INSERT INTO accounts (id, display_name, id_number, account_number, credential_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.display_name)
        .bind(&account.id_number)
        .bind(&account.account_number)
        .bind(&account.credential_hash)
        .bind(account.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("accounts_account_number_key") {
                    return DbError::Duplicate(format!(
                        "Account number {} already exists",
                        account.account_number
                    ));
                }
            }
            DbError::Query(e)
        })?;

        Account::try_from(row)
    }
}
