//! Server Configuration
//!
//! Layered, lowest priority first: built-in defaults, `config/default.*`,
//! `config/local.*`, an explicit `--config` file, `MERCHMARKET__*`
//! environment variables, then CLI flags (applied in `main`).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use merchmarket_api::ApiConfig;
use merchmarket_auth::{config::JwtConfig, config::PasswordConfig, AuthConfig};
use merchmarket_db::DatabaseConfig;
use merchmarket_ledger::LedgerConfig;

/// Signing secret shipped in defaults. Refused outside development mode.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-me-in-production";

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server binding configuration
    pub server: ServerSettings,

    /// Database configuration
    pub database: DatabaseSettings,

    /// Authentication configuration
    pub auth: AuthSettings,

    /// Transfer policy
    pub ledger: LedgerConfig,

    /// HTTP middleware configuration
    pub api: ApiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Server binding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL. When unset the `DATABASE_URL` / `DB_*`
    /// variables are used.
    pub url: Option<String>,

    /// Maximum connections in pool
    pub max_connections: u32,

    /// Minimum connections in pool
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,

    /// Run migrations on startup
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let pool = DatabaseConfig::default();
        Self {
            url: None,
            max_connections: pool.pg_max_connections,
            min_connections: pool.pg_min_connections,
            acquire_timeout_secs: pool.pg_acquire_timeout_secs,
            run_migrations: true,
        }
    }
}

impl DatabaseSettings {
    /// Resolve the connection settings for the storage layer
    pub fn to_db_config(&self) -> anyhow::Result<DatabaseConfig> {
        let postgres_url = match &self.url {
            Some(url) => url.clone(),
            None => DatabaseConfig::from_env()?.postgres_url,
        };

        Ok(DatabaseConfig {
            postgres_url,
            pg_max_connections: self.max_connections,
            pg_min_connections: self.min_connections,
            pg_acquire_timeout_secs: self.acquire_timeout_secs,
        })
    }
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// JWT signing secret
    pub jwt_secret: String,

    /// Lifetime of issued tokens, e.g. "72h"
    #[serde(with = "humantime_serde")]
    pub token_lifetime: Duration,

    /// Coins granted on first login
    pub initial_balance: i64,

    /// Argon2id parameters
    pub password: PasswordConfig,
}

impl Default for AuthSettings {
    fn default() -> Self {
        let defaults = AuthConfig::default();
        Self {
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            token_lifetime: defaults.jwt.token_lifetime,
            initial_balance: defaults.initial_balance,
            password: defaults.password,
        }
    }
}

impl AuthSettings {
    pub fn to_auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt: JwtConfig {
                secret: self.jwt_secret.clone(),
                token_lifetime: self.token_lifetime,
                ..JwtConfig::default()
            },
            password: self.password.clone(),
            initial_balance: self.initial_balance,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter, overridden by `RUST_LOG`
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics
    pub enabled: bool,

    /// Port of the metrics listener
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from files and the environment
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        Self::from_sources(config_path, environment(None))
    }

    fn from_sources(
        config_path: Option<&str>,
        env: config::Environment,
    ) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let config = builder.add_source(env).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Create a configuration for development/testing
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
            ..Self::default()
        }
    }
}

/// `MERCHMARKET__SECTION__KEY` variables, from the process or from `vars`
fn environment(vars: Option<config::Map<String, String>>) -> config::Environment {
    config::Environment::with_prefix("MERCHMARKET")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .source(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> ServerConfig {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_sources(None, environment(Some(map))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_secret, PLACEHOLDER_JWT_SECRET);
        assert_eq!(config.auth.initial_balance, 1000);
        assert_eq!(config.auth.token_lifetime, Duration::from_secs(72 * 3600));
        assert!(config.database.run_migrations);
        assert!(!config.ledger.reject_self_transfer);
    }

    #[test]
    fn test_environment_overrides() {
        let config = from_vars(&[
            ("MERCHMARKET__SERVER__PORT", "9000"),
            ("MERCHMARKET__AUTH__JWT_SECRET", "from-the-environment"),
            ("MERCHMARKET__AUTH__TOKEN_LIFETIME", "1h"),
            ("MERCHMARKET__LEDGER__REJECT_SELF_TRANSFER", "true"),
        ]);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.jwt_secret, "from-the-environment");
        assert_eq!(config.auth.token_lifetime, Duration::from_secs(3600));
        assert!(config.ledger.reject_self_transfer);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_auth_settings_carry_into_auth_config() {
        let settings = AuthSettings {
            jwt_secret: "s3cret".to_string(),
            initial_balance: 42,
            ..AuthSettings::default()
        };
        let auth = settings.to_auth_config();
        assert_eq!(auth.jwt.secret, "s3cret");
        assert_eq!(auth.initial_balance, 42);
        assert!(auth.validate().is_ok());
    }

    #[test]
    fn test_explicit_database_url() {
        let settings = DatabaseSettings {
            url: Some("postgres://u:p@db:5432/shop".to_string()),
            max_connections: 7,
            ..DatabaseSettings::default()
        };
        let db = settings.to_db_config().unwrap();
        assert_eq!(db.postgres_url, "postgres://u:p@db:5432/shop");
        assert_eq!(db.pg_max_connections, 7);
    }

    #[test]
    fn test_socket_addr() {
        let settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        assert_eq!(settings.socket_addr().unwrap().port(), 3000);

        let bad = ServerSettings {
            host: "not a host".to_string(),
            port: 3000,
        };
        assert!(bad.socket_addr().is_err());
    }
}
