//! Coin transfer DTOs

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    /// Recipient username
    #[validate(length(min = 1, message = "toUser is required"))]
    pub to_user: String,
    /// Coins to send, must be positive
    pub amount: i64,
}
