//! Account information handler

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::dto::InfoResponse;
use crate::error::{ApiResult, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::state::AppState;

/// Balance, inventory and coin history of the caller
#[utoipa::path(
    get,
    path = "/api/info",
    tag = "Account",
    responses(
        (status = 200, description = "Account summary", body = InfoResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Account vanished", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<InfoResponse>> {
    let summary = state.query.account_summary(&user.username).await?;
    Ok(Json(InfoResponse::from(summary)))
}
