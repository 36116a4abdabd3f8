//! Coin transfer handler

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::dto::{MessageResponse, SendCoinRequest};
use crate::error::{ApiResult, ErrorResponse};
use crate::extractors::{AuthenticatedUser, ValidatedJson};
use crate::state::AppState;

/// Send coins to another user
#[utoipa::path(
    post,
    path = "/api/sendCoin",
    tag = "Wallet",
    request_body = SendCoinRequest,
    responses(
        (status = 200, description = "Coins sent", body = MessageResponse),
        (status = 400, description = "Invalid amount or insufficient funds", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Sender or recipient not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn send_coin(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<SendCoinRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .engine
        .transfer_coins(&user.username, &request.to_user, request.amount)
        .await?;

    Ok(Json(MessageResponse::new("Монетки успешно отправлены")))
}
