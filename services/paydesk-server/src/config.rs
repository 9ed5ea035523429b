//! Server Configuration
//!
//! Layered configuration for the Paydesk server. Sources, later overriding
//! earlier: an optional `--config` file, `config/default`, `config/local`,
//! then `PAYDESK__`-prefixed environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use paydesk_api::ApiConfig;
use paydesk_auth::AuthConfig;
use paydesk_db::DatabaseConfig;
use serde::{Deserialize, Serialize};

/// JWT secret shipped in sample configs; refused outside dev mode
pub const PLACEHOLDER_JWT_SECRET: &str = "change-me-in-production";

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server binding configuration
    pub server: ServerSettings,

    /// Storage backend and database settings
    pub storage: StorageSettings,

    /// Tokens, credential hashing and rate limits
    pub auth: AuthConfig,

    /// HTTP layer settings
    pub api: ApiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,

    /// Insert the demo employees and customers at startup
    pub seed_demo_accounts: bool,
}

/// Server binding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Seconds in-flight requests get after a shutdown signal
    pub shutdown_grace_secs: u64,

    /// How often idle rate-limit buckets are dropped, in seconds
    pub rate_limit_cleanup_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_grace_secs: 30,
            rate_limit_cleanup_secs: 60,
        }
    }
}

impl ServerSettings {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn rate_limit_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cleanup_secs.max(1))
    }
}

/// Where records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process memory; lost on restart
    Memory,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,

    /// PostgreSQL settings, unused by the memory backend
    pub database: DatabaseConfig,

    /// Run embedded migrations on startup
    pub run_migrations: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            database: DatabaseConfig::default(),
            run_migrations: true,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error); `RUST_LOG` wins
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics
    pub enabled: bool,

    /// Metrics port (separate from main server)
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
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

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment());

        Self::from_builder(builder)
    }

    /// Deserialize from already assembled sources
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let mut loaded: ServerConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if loaded.auth.jwt.secret.is_empty() {
            loaded.auth.jwt.secret = PLACEHOLDER_JWT_SECRET.to_string();
        }

        Ok(loaded)
    }

    /// Check the loaded configuration before anything starts.
    ///
    /// Outside dev mode the placeholder secret and any auth misconfiguration
    /// stop startup; in dev mode they are only logged.
    pub fn validate(&self, dev_mode: bool) -> anyhow::Result<()> {
        if self.auth.jwt.secret == PLACEHOLDER_JWT_SECRET && !dev_mode {
            anyhow::bail!(
                "JWT secret must be changed in production. Set PAYDESK__AUTH__JWT__SECRET or JWT_SECRET."
            );
        }

        if let Err(problems) = self.auth.validate() {
            if !dev_mode {
                anyhow::bail!("Invalid auth configuration: {}", problems.join("; "));
            }
            for problem in problems {
                tracing::warn!(problem = %problem, "Auth configuration accepted in dev mode");
            }
        }

        self.server.socket_addr()?;
        Ok(())
    }
}

/// Environment source: `PAYDESK__SERVER__PORT=9000` sets `server.port`
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("PAYDESK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("api.cors_origins")
}
