//! Merchmarket Storage Layer
//!
//! Persistence for accounts, the merch catalog, purchases and the coin
//! ledger.
//!
//! # Backends
//!
//! - **PostgreSQL** ([`Database`]): production store. Every atomic scope is a
//!   single SQL transaction and account rows are locked with
//!   `SELECT ... FOR UPDATE` before their balance is checked.
//! - **In-memory** ([`MemoryStore`]): development and test store with the
//!   same transactional contract.
//!
//! Both implement [`Store`] so the services above never see which one is in
//! use.

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod repos;
pub mod store;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use models::*;
pub use repos::*;
pub use store::{Store, StoreTx};

/// PostgreSQL connection pool
#[derive(Clone)]
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

    /// Run database migrations, including the catalog seed
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }
}

#[async_trait]
impl Store for Database {
    async fn begin(&self) -> DbResult<Box<dyn StoreTx>> {
        let tx = self
            .pg
            .begin()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn find_account_by_username(&self, username: &str) -> DbResult<Option<DbAccount>> {
        AccountRepo::find_by_username(&self.pg, username).await
    }

    async fn find_account_by_id(&self, id: i64) -> DbResult<Option<DbAccount>> {
        AccountRepo::find_by_id(&self.pg, id).await
    }

    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
        balance: i64,
    ) -> DbResult<DbAccount> {
        AccountRepo::create(&self.pg, username, password_hash, balance).await
    }

    async fn find_catalog_item_by_name(&self, name: &str) -> DbResult<Option<DbMerch>> {
        MerchRepo::find_by_name(&self.pg, name).await
    }

    async fn inventory(&self, account_id: i64) -> DbResult<Vec<DbInventoryItem>> {
        MerchRepo::inventory(&self.pg, account_id).await
    }

    async fn find_ledger_entries_by_source(&self, account_id: i64) -> DbResult<Vec<DbLedgerEntry>> {
        LedgerRepo::find_by_source(&self.pg, account_id).await
    }

    async fn find_ledger_entries_by_destination(
        &self,
        account_id: i64,
    ) -> DbResult<Vec<DbLedgerEntry>> {
        LedgerRepo::find_by_destination(&self.pg, account_id).await
    }

    async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pg).await?;
        Ok(())
    }
}

/// A PostgreSQL transaction
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_account_by_username_for_update(
        &mut self,
        username: &str,
    ) -> DbResult<Option<DbAccount>> {
        AccountRepo::lock_by_username(&mut *self.tx, username).await
    }

    async fn update_account_balance(&mut self, account_id: i64, delta: i64) -> DbResult<i64> {
        AccountRepo::adjust_balance(&mut *self.tx, account_id, delta).await
    }

    async fn create_purchase(&mut self, account_id: i64, merch_id: i64) -> DbResult<DbPurchase> {
        MerchRepo::create_purchase(&mut *self.tx, account_id, merch_id).await
    }

    async fn create_ledger_entry(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> DbResult<DbLedgerEntry> {
        LedgerRepo::create(&mut *self.tx, from_account_id, to_account_id, amount).await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))
    }
}
