//! Account information DTOs

use merchmarket_ledger::{AccountSummary, CoinHistory};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Balance, inventory and transfer history of the caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub coins: i64,
    pub inventory: Vec<InventoryEntry>,
    pub coin_history: CoinHistoryResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InventoryEntry {
    /// Item name
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CoinHistoryResponse {
    pub received: Vec<ReceivedEntry>,
    pub sent: Vec<SentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedEntry {
    pub from_user: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentEntry {
    pub to_user: String,
    pub amount: i64,
}

impl From<CoinHistory> for CoinHistoryResponse {
    fn from(history: CoinHistory) -> Self {
        Self {
            received: history
                .received
                .into_iter()
                .map(|r| ReceivedEntry {
                    from_user: r.from_user,
                    amount: r.amount,
                })
                .collect(),
            sent: history
                .sent
                .into_iter()
                .map(|s| SentEntry {
                    to_user: s.to_user,
                    amount: s.amount,
                })
                .collect(),
        }
    }
}

impl From<AccountSummary> for InfoResponse {
    fn from(summary: AccountSummary) -> Self {
        Self {
            coins: summary.balance,
            inventory: summary
                .inventory
                .into_iter()
                .map(|i| InventoryEntry {
                    item_type: i.item_type,
                    quantity: i.quantity,
                })
                .collect(),
            coin_history: summary.history.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merchmarket_ledger::{InventoryItem, ReceivedCoins, SentCoins};

    #[test]
    fn test_wire_names() {
        let info = InfoResponse::from(AccountSummary {
            balance: 940,
            inventory: vec![InventoryItem {
                item_type: "cup".to_string(),
                quantity: 3,
            }],
            history: CoinHistory {
                received: vec![ReceivedCoins {
                    from_user: "bob".to_string(),
                    amount: 5,
                }],
                sent: vec![SentCoins {
                    to_user: "carol".to_string(),
                    amount: 25,
                }],
            },
        });

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "coins": 940,
                "inventory": [{"type": "cup", "quantity": 3}],
                "coinHistory": {
                    "received": [{"fromUser": "bob", "amount": 5}],
                    "sent": [{"toUser": "carol", "amount": 25}]
                }
            })
        );
    }

    #[test]
    fn test_empty_collections_serialize_as_arrays() {
        let info = InfoResponse::from(AccountSummary {
            balance: 1000,
            inventory: Vec::new(),
            history: CoinHistory::default(),
        });

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["inventory"], serde_json::json!([]));
        assert_eq!(json["coinHistory"]["sent"], serde_json::json!([]));
    }
}
