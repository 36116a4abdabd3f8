//! API Routes

use axum::{
    routing::{get, post},
    Router,
};
use merchmarket_auth::AuthLayer;
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Routes under `/api`. Everything except `/auth` sits behind `auth`.
pub fn api_routes(auth: AuthLayer) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/info", get(handlers::info::get_info))
        .route("/sendCoin", post(handlers::wallet::send_coin))
        .route("/buy/:item", get(handlers::merch::buy_item))
        .route_layer(auth);

    Router::new()
        .route("/auth", post(handlers::auth::authenticate))
        .merge(protected)
}

/// Liveness and readiness probes
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
}

/// Create Swagger UI routes
pub fn swagger_routes() -> Router<Arc<AppState>> {
    use crate::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
