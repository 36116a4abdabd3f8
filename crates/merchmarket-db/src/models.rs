//! Database models - mapped from PostgreSQL tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Coins granted to every account on creation.
pub const INITIAL_BALANCE: i64 = 1000;

// ============================================================================
// Account Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DbAccount {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Catalog Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DbMerch {
    pub id: i64,
    pub name: String,
    pub price: i64,
}

/// One unit of merch bought by an account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DbPurchase {
    pub id: i64,
    pub account_id: i64,
    pub merch_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Purchases of a single item collapsed into a count.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DbInventoryItem {
    pub name: String,
    pub quantity: i64,
}

// ============================================================================
// Ledger Models
// ============================================================================

/// A peer-to-peer coin movement.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DbLedgerEntry {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Default catalog shipped with every deployment.
pub const DEFAULT_CATALOG: &[(&str, i64)] = &[
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];
