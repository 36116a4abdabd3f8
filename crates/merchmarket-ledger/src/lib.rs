//! Merchmarket Ledger - coin movement and account read models
//!
//! - [`TransferEngine`]: peer-to-peer coin transfers and catalog purchases,
//!   each in a single storage transaction
//! - [`QueryFacade`]: balance, inventory and coin history of an account
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. Coins are only moved, never created or destroyed, by a transfer
//! 3. A purchase removes exactly the item price from the buyer
//! 4. A failed operation leaves no trace in the store

pub mod config;
pub mod engine;
pub mod error;
pub mod summary;

pub use config::LedgerConfig;
pub use engine::{PurchaseReceipt, TransferEngine, TransferReceipt};
pub use error::{AccountRole, LedgerError, LedgerResult};
pub use summary::{AccountSummary, CoinHistory, InventoryItem, QueryFacade, ReceivedCoins, SentCoins};
