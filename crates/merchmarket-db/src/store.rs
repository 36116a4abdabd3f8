//! Storage seam shared by the PostgreSQL and in-memory backends.
//!
//! Reads that do not need isolation go through [`Store`] directly. Every
//! balance mutation happens inside a [`StoreTx`] obtained from
//! [`Store::begin`]; account rows read through the transaction are locked
//! until it commits or rolls back.

use async_trait::async_trait;

use crate::error::DbResult;
use crate::models::{DbAccount, DbInventoryItem, DbLedgerEntry, DbMerch, DbPurchase};

/// Storage backend
#[async_trait]
pub trait Store: Send + Sync {
    /// Open an atomic scope.
    async fn begin(&self) -> DbResult<Box<dyn StoreTx>>;

    /// Find account by username
    async fn find_account_by_username(&self, username: &str) -> DbResult<Option<DbAccount>>;

    /// Find account by ID
    async fn find_account_by_id(&self, id: i64) -> DbResult<Option<DbAccount>>;

    /// Create an account. Fails with `DbError::Duplicate` if the username is taken.
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
        balance: i64,
    ) -> DbResult<DbAccount>;

    /// Find catalog item by name
    async fn find_catalog_item_by_name(&self, name: &str) -> DbResult<Option<DbMerch>>;

    /// Purchases of an account grouped by item, in order of first purchase
    async fn inventory(&self, account_id: i64) -> DbResult<Vec<DbInventoryItem>>;

    /// Ledger entries sent by an account, oldest first
    async fn find_ledger_entries_by_source(&self, account_id: i64) -> DbResult<Vec<DbLedgerEntry>>;

    /// Ledger entries received by an account, oldest first
    async fn find_ledger_entries_by_destination(
        &self,
        account_id: i64,
    ) -> DbResult<Vec<DbLedgerEntry>>;

    /// Verify the backend is reachable
    async fn health_check(&self) -> DbResult<()>;
}

/// An open atomic scope.
///
/// Dropping a transaction without calling [`StoreTx::commit`] discards every
/// mutation made through it.
#[async_trait]
pub trait StoreTx: Send {
    /// Find account by username and hold a row lock on it
    async fn find_account_by_username_for_update(
        &mut self,
        username: &str,
    ) -> DbResult<Option<DbAccount>>;

    /// Add a signed delta to an account balance, returning the new balance
    async fn update_account_balance(&mut self, account_id: i64, delta: i64) -> DbResult<i64>;

    /// Record one unit of merch bought by an account
    async fn create_purchase(&mut self, account_id: i64, merch_id: i64) -> DbResult<DbPurchase>;

    /// Append a peer-to-peer ledger entry
    async fn create_ledger_entry(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> DbResult<DbLedgerEntry>;

    /// Publish every mutation made in this scope
    async fn commit(self: Box<Self>) -> DbResult<()>;

    /// Discard every mutation made in this scope
    async fn rollback(self: Box<Self>) -> DbResult<()>;
}
