//! Paydesk API Server
//!
//! Composition root: reads configuration, picks the storage backend, seeds
//! demo accounts when asked, and serves the API until a shutdown signal.
//!
//! # Usage
//!
//! ```bash
//! # In-memory storage with demo accounts
//! paydesk-server --dev-mode --storage memory --seed-demo
//!
//! # Start with custom config
//! paydesk-server --config /path/to/config.toml
//!
//! # Start with environment overrides
//! PAYDESK__SERVER__PORT=9000 paydesk-server
//! ```

mod config;
mod seed;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::{signal, sync::watch};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paydesk_api::{create_router, AppState};
use paydesk_db::{Database, Stores};
use paydesk_types::SystemClock;

use crate::config::{LogFormat, ServerConfig, StorageBackend, StorageSettings};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Paydesk API Server
#[derive(Parser, Debug)]
#[command(name = "paydesk-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "PAYDESK_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "PAYDESK_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PAYDESK_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PAYDESK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format
    #[arg(long, env = "PAYDESK_LOG_FORMAT", value_parser = ["json", "pretty"])]
    log_format: Option<String>,

    /// Storage backend
    #[arg(long, env = "PAYDESK_STORAGE", value_parser = ["postgres", "memory"])]
    storage: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JWT secret key
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Insert the demo accounts at startup
    #[arg(long)]
    seed_demo: bool,

    /// Enable development mode (placeholder secret and weak hashing allowed)
    #[arg(long, env = "PAYDESK_DEV_MODE")]
    dev_mode: bool,
}

impl Args {
    /// Fold CLI overrides into the loaded configuration
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        match self.log_format.as_deref() {
            Some("json") => config.logging.format = LogFormat::Json,
            Some("pretty") => config.logging.format = LogFormat::Pretty,
            _ => {}
        }
        match self.storage.as_deref() {
            Some("memory") => config.storage.backend = StorageBackend::Memory,
            Some("postgres") => config.storage.backend = StorageBackend::Postgres,
            _ => {}
        }
        if let Some(url) = self.database_url {
            config.storage.database.postgres_url = url;
        }
        if let Some(secret) = self.jwt_secret {
            config.auth.jwt.secret = secret;
        }
        if self.seed_demo {
            config.seed_demo_accounts = true;
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let dev_mode = args.dev_mode;

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut server_config);

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dev_mode,
        "Starting Paydesk server"
    );

    server_config.validate(dev_mode)?;

    let stores = init_storage(&server_config.storage).await?;

    let state = Arc::new(AppState::new(
        stores,
        server_config.auth.clone(),
        Arc::new(SystemClock),
    ));

    if server_config.seed_demo_accounts {
        let created = seed::seed_demo_accounts(&state.auth)
            .await
            .context("Failed to seed demo accounts")?;
        tracing::info!(created, "Demo accounts ready");
    }

    if server_config.metrics.enabled {
        start_metrics_exporter(server_config.metrics.port)?;
    }

    spawn_guard_cleanup(state.clone(), server_config.server.rate_limit_cleanup_interval());

    let app = create_router(state, server_config.api.clone());

    let addr = server_config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, "Server listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for(shutdown_rx.clone()))
    .into_future();

    let grace = server_config.server.shutdown_grace();
    tokio::select! {
        result = server => result?,
        _ = async {
            wait_for(shutdown_rx).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed with requests in flight");
        }
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Invalid log level")?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true))
            .try_init()?,
        LogFormat::Pretty => subscriber
            .with(fmt::layer().pretty().with_target(true))
            .try_init()?,
    }

    Ok(())
}

/// Build the stores for the configured backend
async fn init_storage(settings: &StorageSettings) -> anyhow::Result<Stores> {
    match settings.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; records are lost on restart");
            Ok(Stores::in_memory())
        }
        StorageBackend::Postgres => {
            let db = Database::connect(&settings.database).await?;
            if settings.run_migrations {
                db.migrate().await?;
            }

            let stores = db.stores();
            stores
                .transactions
                .ping()
                .await
                .context("Database health check failed")?;

            tracing::info!(
                url = %settings.database.postgres_url_masked(),
                "Database ready"
            );
            Ok(stores)
        }
    }
}

/// Install the Prometheus recorder and its HTTP listener
fn start_metrics_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to start metrics exporter")?;

    tracing::info!(port, "Metrics exporter listening");
    Ok(())
}

/// Periodically drop idle rate-limit buckets
fn spawn_guard_cleanup(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            state.auth.guard.cleanup().await;
            let tracked = state.auth.guard.tracked().await;
            tracing::debug!(tracked, "Rate limit buckets swept");
        }
    });
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

async fn wait_for(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

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
