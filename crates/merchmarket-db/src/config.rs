//! Database configuration

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub postgres_url: String,
    /// Maximum PostgreSQL connections
    pub pg_max_connections: u32,
    /// Minimum PostgreSQL connections
    pub pg_min_connections: u32,
    /// Connection acquire timeout in seconds
    pub pg_acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost:5432/merchmarket".to_string(),
            pg_max_connections: 50,
            pg_min_connections: 5,
            pg_acquire_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create config from environment variables.
    ///
    /// `DATABASE_URL` wins when set; otherwise the URL is assembled from
    /// `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD` and `DB_NAME`.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DatabaseConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let postgres_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = lookup("DB_HOST").ok_or_else(|| {
                    DbError::InvalidInput("DATABASE_URL or DB_HOST must be set".to_string())
                })?;
                let user = lookup("DB_USER").unwrap_or_else(|| "postgres".to_string());
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                let name = lookup("DB_NAME").unwrap_or_else(|| "merchmarket".to_string());
                let port = lookup("DB_PORT").unwrap_or_else(|| "5432".to_string());
                build_postgres_url(&host, &port, &user, &password, &name)
            }
        };

        let defaults = Self::default();
        Ok(Self {
            postgres_url,
            pg_max_connections: lookup("PG_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pg_max_connections),
            pg_min_connections: lookup("PG_MIN_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pg_min_connections),
            pg_acquire_timeout_secs: lookup("PG_ACQUIRE_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pg_acquire_timeout_secs),
        })
    }

    /// Mask sensitive parts of the PostgreSQL URL for logging
    pub fn postgres_url_masked(&self) -> String {
        mask_url(&self.postgres_url)
    }
}

fn build_postgres_url(host: &str, port: &str, user: &str, password: &str, name: &str) -> String {
    if password.is_empty() {
        format!("postgresql://{}@{}:{}/{}", user, host, port, name)
    } else {
        format!("postgresql://{}:{}@{}:{}/{}", user, password, host, port, name)
    }
}

fn mask_url(url: &str) -> String {
    if let (Some(at_pos), Some(scheme_end)) = (url.rfind('@'), url.find("://")) {
        let scheme = &url[..scheme_end + 3];
        let after_at = &url[at_pos..];
        let user_pass = &url[scheme_end + 3..at_pos];
        if let Some(colon_pos) = user_pass.find(':') {
            let user = &user_pass[..colon_pos];
            return format!("{}{}:***{}", scheme, user, after_at);
        }
    }
    url.to_string()
}
