//! OpenAPI Documentation

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::dto;
use crate::error::ErrorResponse;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Merchmarket API",
        description = "Internal merch shop: coins, transfers between colleagues and merch purchases.",
        version = "0.1.0"
    ),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::auth::authenticate,
        handlers::info::get_info,
        handlers::wallet::send_coin,
        handlers::merch::buy_item,
    ),
    components(
        schemas(
            ErrorResponse,
            dto::MessageResponse,
            dto::AuthRequest,
            dto::AuthResponse,
            dto::InfoResponse,
            dto::InventoryEntry,
            dto::CoinHistoryResponse,
            dto::ReceivedEntry,
            dto::SentEntry,
            dto::SendCoinRequest,
            handlers::health::HealthResponse,
            handlers::health::ReadinessResponse,
            handlers::health::ComponentStatus,
        )
    ),
    tags(
        (name = "Health", description = "Service health and status"),
        (name = "Authentication", description = "Login and implicit registration"),
        (name = "Account", description = "Balance, inventory and history"),
        (name = "Wallet", description = "Coin transfers"),
        (name = "Merch", description = "Merch purchases")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by protected paths
pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Merchmarket API");
        assert!(spec.paths.paths.contains_key("/api/sendCoin"));
        assert!(spec.paths.paths.contains_key("/api/buy/{item}"));
    }

    #[test]
    fn test_openapi_json() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("bearer"));
        assert!(json.contains("coinHistory"));
    }
}
