//! Merchmarket Authentication Layer
//!
//! - **Identity Gateway**: username/password login that registers unseen
//!   users with the starting coin balance
//! - **JWT**: HS256 bearer tokens binding a username, 72 hours by default
//! - **Password Security**: Argon2id hashing with optional pepper
//! - **Middleware**: tower layer that guards protected routes
//!
//! ```text
//! POST /api/auth ──▶ IdentityGateway ──▶ Store (find / create account)
//!                          │
//!                          ▼
//!                     JwtService::issue ──▶ token
//!
//! protected request ──▶ AuthLayer ──▶ JwtService::verify ──▶ AuthenticatedUser
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod types;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult, ErrorResponse};
pub use gateway::{Authenticated, IdentityGateway};
pub use jwt::JwtService;
pub use middleware::{AuthLayer, AuthMiddleware};
pub use password::PasswordService;
pub use types::*;

use merchmarket_db::Store;
use std::sync::Arc;

/// Authentication service bundling the gateway and token verification
#[derive(Clone)]
pub struct AuthService {
    pub jwt: Arc<JwtService>,
    pub identity: IdentityGateway,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(store: Arc<dyn Store>, config: AuthConfig) -> AuthResult<Self> {
        config.validate()?;

        let jwt = JwtService::new(config.jwt);
        let password = PasswordService::new(config.password);
        let identity = IdentityGateway::new(
            store,
            jwt.clone(),
            password,
            config.initial_balance,
        );

        Ok(Self {
            jwt: Arc::new(jwt),
            identity,
        })
    }

    /// Create an auth layer for Axum router
    pub fn layer(&self) -> AuthLayer {
        AuthLayer::new(self.jwt.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merchmarket_db::MemoryStore;

    #[test]
    fn test_empty_secret_rejected() {
        let result = AuthService::new(Arc::new(MemoryStore::new()), AuthConfig::default());
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[tokio::test]
    async fn test_gateway_and_layer_share_secret() {
        let mut config = AuthConfig::with_secret("shared-secret-for-both-halves-of-auth");
        config.password.memory_cost = 4096;
        config.password.time_cost = 1;
        let service = AuthService::new(Arc::new(MemoryStore::new()), config).unwrap();

        let session = service.identity.authenticate("erin", "pw").await.unwrap();
        let claims = service.jwt.verify(&session.token.token).unwrap();
        assert_eq!(claims.username, "erin");
    }
}
