//! Query Façade
//!
//! Read-only view of an account: balance, what it bought and who it traded
//! coins with. Counterparty names are resolved when the summary is built.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use merchmarket_db::{DbLedgerEntry, Store};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AccountRole, LedgerError, LedgerResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    pub item_type: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivedCoins {
    pub from_user: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentCoins {
    pub to_user: String,
    pub amount: i64,
}

/// Transfers touching an account, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoinHistory {
    pub received: Vec<ReceivedCoins>,
    pub sent: Vec<SentCoins>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub balance: i64,
    /// Items in order of first purchase
    pub inventory: Vec<InventoryItem>,
    pub history: CoinHistory,
}

/// Read models over the store
#[derive(Clone)]
pub struct QueryFacade {
    store: Arc<dyn Store>,
}

impl QueryFacade {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Balance, inventory and coin history of `username`
    pub async fn account_summary(&self, username: &str) -> LedgerResult<AccountSummary> {
        let account = self
            .store
            .find_account_by_username(username)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound {
                role: AccountRole::Owner,
                username: username.to_string(),
            })?;

        let inventory = self
            .store
            .inventory(account.id)
            .await?
            .into_iter()
            .map(|item| InventoryItem {
                item_type: item.name,
                quantity: item.quantity,
            })
            .collect();

        let sent_entries = self.store.find_ledger_entries_by_source(account.id).await?;
        let received_entries = self
            .store
            .find_ledger_entries_by_destination(account.id)
            .await?;

        let sent = self
            .resolve_counterparties(sent_entries, |entry| entry.to_account_id)
            .await
            .into_iter()
            .map(|(to_user, amount)| SentCoins { to_user, amount })
            .collect();
        let received = self
            .resolve_counterparties(received_entries, |entry| entry.from_account_id)
            .await
            .into_iter()
            .map(|(from_user, amount)| ReceivedCoins { from_user, amount })
            .collect();

        Ok(AccountSummary {
            balance: account.balance,
            inventory,
            history: CoinHistory { received, sent },
        })
    }

    /// Pair each entry with the other party's username. Entries whose
    /// counterparty cannot be read are skipped.
    async fn resolve_counterparties(
        &self,
        entries: Vec<DbLedgerEntry>,
        counterparty: fn(&DbLedgerEntry) -> i64,
    ) -> Vec<(String, i64)> {
        stream::iter(entries)
            .filter_map(|entry| async move {
                let account_id = counterparty(&entry);
                match self.store.find_account_by_id(account_id).await {
                    Ok(Some(account)) => Some((account.username, entry.amount)),
                    Ok(None) => {
                        debug!(entry_id = entry.id, account_id, "Counterparty missing, skipping entry");
                        None
                    }
                    Err(e) => {
                        warn!(entry_id = entry.id, account_id, error = %e, "Counterparty lookup failed, skipping entry");
                        None
                    }
                }
            })
            .collect()
            .await
    }
}
