//! JWT Token Service
//!
//! HS256 bearer tokens binding a username. The signing secret comes from
//! [`JwtConfig`] and is fixed for the lifetime of the service.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{IssuedToken, TokenClaims};

/// JWT service for token management
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for `username`, valid for the configured lifetime
    pub fn issue(&self, username: &str) -> AuthResult<IssuedToken> {
        self.issue_at(username, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let lifetime = Duration::from_std(self.config.token_lifetime)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let expires_at = now + lifetime;

        let claims = TokenClaims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenSigningFailed(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = self.config.leeway_secs;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;

        if token_data.claims.username.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(token_data.claims)
    }
}
