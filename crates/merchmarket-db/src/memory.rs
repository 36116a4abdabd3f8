//! In-memory storage backend
//!
//! Used for development (`--in-memory`) and as the test backend for the
//! services built on [`Store`]. A transaction holds the write lock for its
//! whole lifetime and works on a private copy of the state, so concurrent
//! scopes are serialized and an abandoned scope leaves nothing behind.
//!
//! Calling a [`Store`] method while holding a transaction from the same
//! store waits for that transaction to finish.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::error::{DbError, DbResult};
use crate::models::{
    DbAccount, DbInventoryItem, DbLedgerEntry, DbMerch, DbPurchase, DEFAULT_CATALOG,
};
use crate::store::{Store, StoreTx};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: Vec<DbAccount>,
    merch: Vec<DbMerch>,
    purchases: Vec<DbPurchase>,
    ledger: Vec<DbLedgerEntry>,
}

impl MemoryState {
    fn account_by_username(&self, username: &str) -> Option<&DbAccount> {
        self.accounts.iter().find(|a| a.username == username)
    }

    fn account_by_id(&self, id: i64) -> Option<&DbAccount> {
        self.accounts.iter().find(|a| a.id == id)
    }

    fn merch_by_id(&self, id: i64) -> Option<&DbMerch> {
        self.merch.iter().find(|m| m.id == id)
    }

    fn insert_account(
        &mut self,
        username: &str,
        password_hash: &str,
        balance: i64,
    ) -> DbResult<DbAccount> {
        if self.account_by_username(username).is_some() {
            return Err(DbError::Duplicate(format!("Username {} already exists", username)));
        }
        if balance < 0 {
            return Err(DbError::Constraint(
                "accounts_balance_non_negative".to_string(),
            ));
        }
        let account = DbAccount {
            id: self.accounts.len() as i64 + 1,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            balance,
            created_at: Utc::now(),
        };
        self.accounts.push(account.clone());
        Ok(account)
    }
}

/// In-memory [`Store`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store with no catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the standard catalog
    pub fn with_default_catalog() -> Self {
        let mut state = MemoryState::default();
        for (name, price) in DEFAULT_CATALOG {
            state.merch.push(DbMerch {
                id: state.merch.len() as i64 + 1,
                name: (*name).to_string(),
                price: *price,
            });
        }
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Every ledger entry, oldest first
    pub async fn ledger_entries(&self) -> Vec<DbLedgerEntry> {
        self.state.read().await.ledger.clone()
    }

    /// Every purchase, oldest first
    pub async fn purchases(&self) -> Vec<DbPurchase> {
        self.state.read().await.purchases.clone()
    }

    /// Number of accounts
    pub async fn account_count(&self) -> usize {
        self.state.read().await.accounts.len()
    }

    /// Sum of balances plus the price of everything bought.
    pub async fn coins_in_circulation(&self) -> i64 {
        let state = self.state.read().await;
        let balances: i64 = state.accounts.iter().map(|a| a.balance).sum();
        let spent: i64 = state
            .purchases
            .iter()
            .filter_map(|p| state.merch_by_id(p.merch_id))
            .map(|m| m.price)
            .sum();
        balances + spent
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> DbResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().write_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn find_account_by_username(&self, username: &str) -> DbResult<Option<DbAccount>> {
        Ok(self.state.read().await.account_by_username(username).cloned())
    }

    async fn find_account_by_id(&self, id: i64) -> DbResult<Option<DbAccount>> {
        Ok(self.state.read().await.account_by_id(id).cloned())
    }

    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
        balance: i64,
    ) -> DbResult<DbAccount> {
        self.state
            .write()
            .await
            .insert_account(username, password_hash, balance)
    }

    async fn find_catalog_item_by_name(&self, name: &str) -> DbResult<Option<DbMerch>> {
        let state = self.state.read().await;
        Ok(state.merch.iter().find(|m| m.name == name).cloned())
    }

    async fn inventory(&self, account_id: i64) -> DbResult<Vec<DbInventoryItem>> {
        let state = self.state.read().await;
        let mut items: Vec<DbInventoryItem> = Vec::new();
        for purchase in state.purchases.iter().filter(|p| p.account_id == account_id) {
            let Some(merch) = state.merch_by_id(purchase.merch_id) else {
                continue;
            };
            match items.iter_mut().find(|i| i.name == merch.name) {
                Some(item) => item.quantity += 1,
                None => items.push(DbInventoryItem {
                    name: merch.name.clone(),
                    quantity: 1,
                }),
            }
        }
        Ok(items)
    }

    async fn find_ledger_entries_by_source(&self, account_id: i64) -> DbResult<Vec<DbLedgerEntry>> {
        let state = self.state.read().await;
        Ok(state
            .ledger
            .iter()
            .filter(|e| e.from_account_id == account_id)
            .cloned()
            .collect())
    }

    async fn find_ledger_entries_by_destination(
        &self,
        account_id: i64,
    ) -> DbResult<Vec<DbLedgerEntry>> {
        let state = self.state.read().await;
        Ok(state
            .ledger
            .iter()
            .filter(|e| e.to_account_id == account_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> DbResult<()> {
        Ok(())
    }
}

/// Transaction over a [`MemoryStore`]
struct MemoryTx {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_account_by_username_for_update(
        &mut self,
        username: &str,
    ) -> DbResult<Option<DbAccount>> {
        Ok(self.working.account_by_username(username).cloned())
    }

    async fn update_account_balance(&mut self, account_id: i64, delta: i64) -> DbResult<i64> {
        let account = self
            .working
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| DbError::NotFound(format!("Account {}", account_id)))?;

        let balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| DbError::InvalidInput("Balance overflow".to_string()))?;
        if balance < 0 {
            return Err(DbError::Constraint(format!(
                "Balance update for account {}: accounts_balance_non_negative",
                account_id
            )));
        }
        account.balance = balance;
        Ok(balance)
    }

    async fn create_purchase(&mut self, account_id: i64, merch_id: i64) -> DbResult<DbPurchase> {
        if self.working.account_by_id(account_id).is_none() {
            return Err(DbError::NotFound(format!("Account {}", account_id)));
        }
        if self.working.merch_by_id(merch_id).is_none() {
            return Err(DbError::NotFound(format!("Merch {}", merch_id)));
        }
        let purchase = DbPurchase {
            id: self.working.purchases.len() as i64 + 1,
            account_id,
            merch_id,
            created_at: Utc::now(),
        };
        self.working.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn create_ledger_entry(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> DbResult<DbLedgerEntry> {
        if amount <= 0 {
            return Err(DbError::Constraint(
                "ledger_entries_amount_positive".to_string(),
            ));
        }
        for id in [from_account_id, to_account_id] {
            if self.working.account_by_id(id).is_none() {
                return Err(DbError::NotFound(format!("Account {}", id)));
            }
        }
        let entry = DbLedgerEntry {
            id: self.working.ledger.len() as i64 + 1,
            from_account_id,
            to_account_id,
            amount,
            created_at: Utc::now(),
        };
        self.working.ledger.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find_account() {
        let store = MemoryStore::new();
        let created = store.create_account("alice", "hash", 1000).await.unwrap();
        assert_eq!(created.id, 1);

        let found = store.find_account_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(store.find_account_by_id(1).await.unwrap().unwrap().username, "alice");
        assert!(store.find_account_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = MemoryStore::new();
        store.create_account("alice", "hash", 1000).await.unwrap();
        let result = store.create_account("alice", "other", 1000).await;
        assert!(matches!(result, Err(DbError::Duplicate(_))));
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = MemoryStore::with_default_catalog();
        let alice = store.create_account("alice", "hash", 100).await.unwrap();
        let cup = store.find_catalog_item_by_name("cup").await.unwrap().unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.update_account_balance(alice.id, -cup.price).await.unwrap(), 80);
        tx.create_purchase(alice.id, cup.id).await.unwrap();
        tx.commit().await.unwrap();

        let alice = store.find_account_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.balance, 80);
        assert_eq!(store.purchases().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_changes() {
        let store = MemoryStore::new();
        let alice = store.create_account("alice", "hash", 100).await.unwrap();
        let bob = store.create_account("bob", "hash", 100).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.update_account_balance(alice.id, -40).await.unwrap();
            tx.update_account_balance(bob.id, 40).await.unwrap();
            tx.create_ledger_entry(alice.id, bob.id, 40).await.unwrap();
        }

        let alice = store.find_account_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(alice.balance, 100);
        assert!(store.ledger_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let store = MemoryStore::new();
        let alice = store.create_account("alice", "hash", 100).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.update_account_balance(alice.id, -100).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.find_account_by_id(alice.id).await.unwrap().unwrap().balance, 100);
    }

    #[tokio::test]
    async fn test_balance_cannot_go_negative() {
        let store = MemoryStore::new();
        let alice = store.create_account("alice", "hash", 10).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let result = tx.update_account_balance(alice.id, -11).await;
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_inventory_groups_in_first_purchase_order() {
        let store = MemoryStore::with_default_catalog();
        let alice = store.create_account("alice", "hash", 1000).await.unwrap();
        let cup = store.find_catalog_item_by_name("cup").await.unwrap().unwrap();
        let pen = store.find_catalog_item_by_name("pen").await.unwrap().unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.create_purchase(alice.id, pen.id).await.unwrap();
        tx.create_purchase(alice.id, cup.id).await.unwrap();
        tx.create_purchase(alice.id, pen.id).await.unwrap();
        tx.commit().await.unwrap();

        let inventory = store.inventory(alice.id).await.unwrap();
        assert_eq!(
            inventory,
            vec![
                DbInventoryItem { name: "pen".to_string(), quantity: 2 },
                DbInventoryItem { name: "cup".to_string(), quantity: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_ledger_queries_split_by_direction() {
        let store = MemoryStore::new();
        let alice = store.create_account("alice", "hash", 100).await.unwrap();
        let bob = store.create_account("bob", "hash", 100).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.create_ledger_entry(alice.id, bob.id, 10).await.unwrap();
        tx.create_ledger_entry(bob.id, alice.id, 5).await.unwrap();
        tx.commit().await.unwrap();

        let sent = store.find_ledger_entries_by_source(alice.id).await.unwrap();
        let received = store.find_ledger_entries_by_destination(alice.id).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount, 10);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].from_account_id, bob.id);
    }

    #[tokio::test]
    async fn test_catalog_seed() {
        let store = MemoryStore::with_default_catalog();
        for (name, price) in DEFAULT_CATALOG {
            let item = store.find_catalog_item_by_name(name).await.unwrap().unwrap();
            assert_eq!(item.price, *price);
        }
        assert!(store.find_catalog_item_by_name("yacht").await.unwrap().is_none());
        assert!(MemoryStore::new().find_catalog_item_by_name("cup").await.unwrap().is_none());
    }
}
