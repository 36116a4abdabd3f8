//! Merchmarket API Server
//!
//! Internal merch shop: employees log in, get coins, send coins to each
//! other and spend them on merch.
//!
//! # Usage
//!
//! ```bash
//! # PostgreSQL from DATABASE_URL or DB_HOST/DB_USER/DB_PASSWORD/DB_NAME/DB_PORT
//! JWT_SECRET_KEY=... merchmarket-server
//!
//! # Throwaway in-memory store
//! merchmarket-server --in-memory --dev-mode
//!
//! # Environment overrides
//! MERCHMARKET__SERVER__PORT=9000 merchmarket-server
//! ```

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use merchmarket_api::{create_router, AppState};
use merchmarket_auth::AuthService;
use merchmarket_db::{Database, MemoryStore, Store};

use crate::config::{ServerConfig, PLACEHOLDER_JWT_SECRET};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Merchmarket API Server
#[derive(Parser, Debug)]
#[command(name = "merchmarket-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "MERCHMARKET_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "MERCHMARKET_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MERCHMARKET_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MERCHMARKET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "MERCHMARKET_LOG_FORMAT")]
    log_format: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JWT secret key
    #[arg(long, env = "JWT_SECRET_KEY")]
    jwt_secret: Option<String>,

    /// Enable development mode (placeholder secret allowed)
    #[arg(long, env = "MERCHMARKET_DEV_MODE")]
    dev_mode: bool,

    /// Keep everything in memory instead of PostgreSQL
    #[arg(long, env = "MERCHMARKET_IN_MEMORY")]
    in_memory: bool,
}

impl Args {
    /// Apply CLI overrides on top of the loaded configuration
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        if let Some(secret) = &self.jwt_secret {
            config.auth.jwt_secret = secret.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut server_config);

    init_logging(&server_config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Merchmarket API Server"
    );

    validate_config(&server_config, args.dev_mode)?;

    let store = init_store(&server_config, args.in_memory).await?;

    let auth = AuthService::new(store.clone(), server_config.auth.to_auth_config())?;
    tracing::info!(
        token_lifetime = ?server_config.auth.token_lifetime,
        initial_balance = server_config.auth.initial_balance,
        "Authentication service initialized"
    );

    let state = Arc::new(AppState::new(
        store,
        auth,
        server_config.ledger.clone(),
    ));

    let app = create_router(state, server_config.api.clone());

    if server_config.metrics.enabled {
        start_metrics_exporter(&server_config.metrics)?;
    }

    let addr = server_config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }
}

/// Validate configuration
fn validate_config(config: &ServerConfig, dev_mode: bool) -> anyhow::Result<()> {
    if config.auth.jwt_secret.is_empty() {
        anyhow::bail!("JWT secret is empty. Set JWT_SECRET_KEY or MERCHMARKET__AUTH__JWT_SECRET.");
    }

    if config.auth.jwt_secret == PLACEHOLDER_JWT_SECRET {
        if !dev_mode {
            anyhow::bail!(
                "JWT secret must be changed outside development mode. Set JWT_SECRET_KEY or MERCHMARKET__AUTH__JWT_SECRET."
            );
        }
        tracing::warn!("Using the placeholder JWT secret (development mode)");
    }

    Ok(())
}

/// Open the storage backend
async fn init_store(config: &ServerConfig, in_memory: bool) -> anyhow::Result<Arc<dyn Store>> {
    if in_memory {
        tracing::warn!("Using in-memory storage; all data is lost on shutdown");
        return Ok(Arc::new(MemoryStore::with_default_catalog()));
    }

    let db_config = config.database.to_db_config()?;
    tracing::info!(url = %db_config.postgres_url_masked(), "Connecting to database...");

    let db = Database::connect(&db_config).await?;

    if config.database.run_migrations {
        db.migrate().await?;
    }

    db.health_check().await?;
    tracing::info!("Database health check passed");

    Ok(Arc::new(db))
}

/// Install the Prometheus recorder and its HTTP listener
fn start_metrics_exporter(config: &config::MetricsConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics exporter started");

    Ok(())
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
