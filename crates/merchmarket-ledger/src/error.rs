//! Ledger error types

use std::fmt;

use merchmarket_db::DbError;
use thiserror::Error;

/// Which party of an operation an account lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    /// Sender of a coin transfer
    Source,
    /// Recipient of a coin transfer
    Destination,
    /// Account paying for a purchase
    Buyer,
    /// Account whose summary is requested
    Owner,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Destination => "destination",
            Self::Buyer => "buyer",
            Self::Owner => "owner",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid amount: {amount} (must be positive)")]
    InvalidAmount { amount: i64 },

    #[error("Item name is required")]
    MissingItem,

    #[error("Transfers to the same account are not allowed")]
    SelfTransfer,

    #[error("Account not found ({role}): {username}")]
    AccountNotFound { role: AccountRole, username: String },

    #[error("Item not found: {name}")]
    ItemNotFound { name: String },

    #[error("Insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: i64, required: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Commit failed: {0}")]
    Commit(#[source] DbError),
}

impl LedgerError {
    /// Short label used for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::MissingItem => "missing_item",
            Self::SelfTransfer => "self_transfer",
            Self::AccountNotFound { .. } => "account_not_found",
            Self::ItemNotFound { .. } => "item_not_found",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Storage(_) => "storage",
            Self::Commit(_) => "commit",
        }
    }

    /// Whether the failure is on our side
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Commit(_))
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
