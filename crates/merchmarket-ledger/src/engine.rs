//! Transfer Engine
//!
//! Every balance mutation runs inside one storage transaction. Account rows
//! are locked before they are checked, so two operations debiting the same
//! account serialize and neither can spend coins the other already spent.
//! Any failure after `begin` rolls the whole scope back.

use std::sync::Arc;

use merchmarket_db::{DbAccount, DbLedgerEntry, DbMerch, DbPurchase, Store, StoreTx};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::{AccountRole, LedgerError, LedgerResult};

pub const TRANSFERS_TOTAL: &str = "merchmarket_transfers_total";
pub const PURCHASES_TOTAL: &str = "merchmarket_purchases_total";
pub const REJECTED_OPERATIONS_TOTAL: &str = "merchmarket_rejected_operations_total";

/// Result of a committed coin transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub entry: DbLedgerEntry,
    /// Sender balance after the transfer
    pub source_balance: i64,
    /// Recipient balance after the transfer
    pub destination_balance: i64,
}

/// Result of a committed purchase
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub purchase: DbPurchase,
    pub item: DbMerch,
    /// Buyer balance after paying
    pub balance: i64,
}

/// Moves coins between accounts and spends them on catalog items
#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn Store>,
    config: LedgerConfig,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn Store>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Move `amount` coins from `from` to `to`.
    ///
    /// Checks run in a fixed order: the sender must exist, then hold at least
    /// `amount`, and only then is the recipient required to exist.
    pub async fn transfer_coins(
        &self,
        from: &str,
        to: &str,
        amount: i64,
    ) -> LedgerResult<TransferReceipt> {
        let result = self.try_transfer(from, to, amount).await;

        match &result {
            Ok(receipt) => {
                metrics::counter!(TRANSFERS_TOTAL).increment(1);
                info!(
                    entry_id = receipt.entry.id,
                    from = %from,
                    to = %to,
                    amount,
                    source_balance = receipt.source_balance,
                    "Coins transferred"
                );
            }
            Err(e) => record_rejection("transfer", e),
        }

        result
    }

    async fn try_transfer(&self, from: &str, to: &str, amount: i64) -> LedgerResult<TransferReceipt> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }
        if self.config.reject_self_transfer && from == to {
            return Err(LedgerError::SelfTransfer);
        }

        let mut tx = self.store.begin().await?;
        match transfer_in(tx.as_mut(), from, to, amount).await {
            Ok(receipt) => {
                tx.commit().await.map_err(LedgerError::Commit)?;
                Ok(receipt)
            }
            Err(e) => {
                abort(tx).await;
                Err(e)
            }
        }
    }

    /// Buy one unit of `item_name` for `buyer`.
    pub async fn purchase_item(&self, buyer: &str, item_name: &str) -> LedgerResult<PurchaseReceipt> {
        let result = self.try_purchase(buyer, item_name).await;

        match &result {
            Ok(receipt) => {
                metrics::counter!(PURCHASES_TOTAL).increment(1);
                info!(
                    purchase_id = receipt.purchase.id,
                    buyer = %buyer,
                    item = %receipt.item.name,
                    price = receipt.item.price,
                    balance = receipt.balance,
                    "Item purchased"
                );
            }
            Err(e) => record_rejection("purchase", e),
        }

        result
    }

    async fn try_purchase(&self, buyer: &str, item_name: &str) -> LedgerResult<PurchaseReceipt> {
        if item_name.is_empty() {
            return Err(LedgerError::MissingItem);
        }

        let item = self
            .store
            .find_catalog_item_by_name(item_name)
            .await?
            .ok_or_else(|| LedgerError::ItemNotFound {
                name: item_name.to_string(),
            })?;

        let mut tx = self.store.begin().await?;
        match purchase_in(tx.as_mut(), buyer, item).await {
            Ok(receipt) => {
                tx.commit().await.map_err(LedgerError::Commit)?;
                Ok(receipt)
            }
            Err(e) => {
                abort(tx).await;
                Err(e)
            }
        }
    }
}

async fn transfer_in(
    tx: &mut dyn StoreTx,
    from: &str,
    to: &str,
    amount: i64,
) -> LedgerResult<TransferReceipt> {
    let (source, destination) = lock_pair(tx, from, to).await?;

    let source = source.ok_or_else(|| LedgerError::AccountNotFound {
        role: AccountRole::Source,
        username: from.to_string(),
    })?;
    if source.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            available: source.balance,
            required: amount,
        });
    }
    let destination = destination.ok_or_else(|| LedgerError::AccountNotFound {
        role: AccountRole::Destination,
        username: to.to_string(),
    })?;

    let debited = tx.update_account_balance(source.id, -amount).await?;
    let destination_balance = tx.update_account_balance(destination.id, amount).await?;
    let entry = tx
        .create_ledger_entry(source.id, destination.id, amount)
        .await?;

    let source_balance = if source.id == destination.id {
        destination_balance
    } else {
        debited
    };

    Ok(TransferReceipt {
        entry,
        source_balance,
        destination_balance,
    })
}

async fn purchase_in(tx: &mut dyn StoreTx, buyer: &str, item: DbMerch) -> LedgerResult<PurchaseReceipt> {
    let account = tx
        .find_account_by_username_for_update(buyer)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound {
            role: AccountRole::Buyer,
            username: buyer.to_string(),
        })?;

    if account.balance < item.price {
        return Err(LedgerError::InsufficientFunds {
            available: account.balance,
            required: item.price,
        });
    }

    let balance = tx.update_account_balance(account.id, -item.price).await?;
    let purchase = tx.create_purchase(account.id, item.id).await?;

    Ok(PurchaseReceipt {
        purchase,
        item,
        balance,
    })
}

/// Lock both parties of a transfer, always in username order so opposing
/// transfers cannot deadlock each other.
async fn lock_pair(
    tx: &mut dyn StoreTx,
    from: &str,
    to: &str,
) -> LedgerResult<(Option<DbAccount>, Option<DbAccount>)> {
    if from == to {
        let account = tx.find_account_by_username_for_update(from).await?;
        return Ok((account.clone(), account));
    }

    if from < to {
        let source = tx.find_account_by_username_for_update(from).await?;
        let destination = tx.find_account_by_username_for_update(to).await?;
        Ok((source, destination))
    } else {
        let destination = tx.find_account_by_username_for_update(to).await?;
        let source = tx.find_account_by_username_for_update(from).await?;
        Ok((source, destination))
    }
}

async fn abort(tx: Box<dyn StoreTx>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "Rollback failed");
    }
}

fn record_rejection(operation: &'static str, error: &LedgerError) {
    metrics::counter!(
        REJECTED_OPERATIONS_TOTAL,
        "operation" => operation,
        "reason" => error.reason()
    )
    .increment(1);

    if error.is_internal() {
        warn!(operation, error = %error, "Operation failed");
    } else {
        debug!(operation, error = %error, "Operation rejected");
    }
}
