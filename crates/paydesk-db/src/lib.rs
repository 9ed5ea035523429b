//! Paydesk Database Layer
//!
//! Persistence for accounts and transaction records.
//!
//! # Architecture
//!
//! - **Traits**: [`AccountStore`] and [`TransactionStore`] are the only
//!   surface the rest of the workspace sees
//! - **PostgreSQL**: [`AccountRepo`] and [`TransactionRepo`] over a shared
//!   `PgPool`, with schema managed by embedded migrations
//! - **Memory** (`mock` feature): a single-process store for tests and dev mode
//!
//! Status changes go through [`TransactionStore::update_status`], a
//! compare-and-set keyed by the status the caller last observed.

pub mod config;
pub mod error;
pub mod models;
pub mod repos;
pub mod store;

#[cfg(any(test, feature = "mock"))]
pub mod memory;

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use models::*;
pub use repos::*;
pub use store::*;

#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryStore;

/// PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pub pg: PgPool,
}

impl Database {
    /// Connect to PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

        let pg = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.pg_acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {}", e)))?;

        info!("Connected to PostgreSQL");
        Ok(Self { pg })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    pub fn account_repo(&self) -> AccountRepo {
        AccountRepo::new(self.pg.clone())
    }

    pub fn transaction_repo(&self) -> TransactionRepo {
        TransactionRepo::new(self.pg.clone())
    }

    /// Trait-object stores backed by this pool
    pub fn stores(&self) -> Stores {
        Stores::new(
            Arc::new(self.account_repo()),
            Arc::new(self.transaction_repo()),
        )
    }
}
