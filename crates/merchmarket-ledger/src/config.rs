//! Ledger configuration

use serde::{Deserialize, Serialize};

/// Policy knobs for the transfer engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Refuse transfers where sender and recipient are the same account.
    /// Allowed by default; such a transfer leaves the balance unchanged.
    pub reject_self_transfer: bool,
}
