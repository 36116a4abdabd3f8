//! Merch purchase handler

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::dto::MessageResponse;
use crate::error::{ApiResult, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::state::AppState;

/// Buy one unit of a catalog item
#[utoipa::path(
    get,
    path = "/api/buy/{item}",
    tag = "Merch",
    params(("item" = String, Path, description = "Catalog item name")),
    responses(
        (status = 200, description = "Item bought", body = MessageResponse),
        (status = 400, description = "Insufficient funds", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Unknown item or user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn buy_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(item): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let receipt = state.engine.purchase_item(&user.username, &item).await?;

    Ok(Json(MessageResponse::new(format!(
        "Предмет {} успешно куплен",
        receipt.item.name
    ))))
}
