//! Authentication configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AuthError, AuthResult};

/// Main authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Password hashing configuration
    pub password: PasswordConfig,
    /// Coins granted to an account created on first login
    pub initial_balance: i64,
}

impl AuthConfig {
    /// Build a config around a signing secret, everything else defaulted
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt: JwtConfig {
                secret: secret.into(),
                ..JwtConfig::default()
            },
            ..Self::default()
        }
    }

    /// Reject configurations that cannot issue usable tokens
    pub fn validate(&self) -> AuthResult<()> {
        if self.jwt.secret.is_empty() {
            return Err(AuthError::Config("JWT secret must not be empty".to_string()));
        }
        if self.jwt.token_lifetime.is_zero() {
            return Err(AuthError::Config("Token lifetime must be positive".to_string()));
        }
        if self.initial_balance < 0 {
            return Err(AuthError::Config("Initial balance must not be negative".to_string()));
        }
        Ok(())
    }
}

/// JWT token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HMAC secret used to sign and verify tokens
    pub secret: String,
    /// How long an issued token stays valid
    #[serde(with = "humantime_serde")]
    pub token_lifetime: Duration,
    /// Clock skew tolerated when checking expiry, in seconds
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_lifetime: Duration::from_secs(72 * 60 * 60),
            leeway_secs: 0,
        }
    }
}

/// Password hashing configuration (Argon2id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Output hash length in bytes
    pub hash_length: u32,
    /// Pepper (additional secret, optional)
    pub pepper: Option<String>,
    /// Maximum accepted password length in bytes
    pub max_password_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            pepper: None,
            max_password_length: 128,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            password: PasswordConfig::default(),
            initial_balance: merchmarket_db::INITIAL_BALANCE,
        }
    }
}
