//! Authentication Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::dto::{AuthRequest, AuthResponse};
use crate::error::{ApiResult, ErrorResponse};
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Log in, registering the user on first sight
#[utoipa::path(
    post,
    path = "/api/auth",
    tag = "Authentication",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Wrong password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AuthRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let session = state
        .auth
        .identity
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(AuthResponse {
        token: session.token.token,
    }))
}
