//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits so a partial TOML file still produces a full
//! configuration; environment variables are layered on top by `loader.rs`.

use serde::{Deserialize, Serialize};

/// Root configuration for the weather monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Upstream weather provider and the location to observe.
    pub provider: ProviderConfig,

    /// Observation store connection.
    pub database: DatabaseConfig,

    /// Collection cadence.
    pub collector: CollectorConfig,

    /// Probe and query API listener.
    pub server: ServerConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Weather provider configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API credential. Required; checked when the client is built.
    pub api_key: Option<String>,

    /// City to observe.
    pub city: String,

    /// Country of the city.
    pub country: String,

    /// Base URL of the provider API (no trailing slash).
    pub base_url: String,

    /// Network timeout for a single fetch, in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            city: "Mississauga".to_string(),
            country: "Canada".to_string(),
            base_url: "http://api.weatherapi.com/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

// Keeps the credential out of logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("city", &self.city)
            .field("country", &self.country)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Which store implementation backs the observation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL via sqlx.
    #[default]
    Postgres,
    /// Volatile in-process table.
    Memory,
}

/// Database connection configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
    pub port: u16,

    /// How long a query waits for a pooled connection, in seconds.
    pub acquire_timeout_secs: u64,

    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            host: "postgres".to_string(),
            name: "weather_db".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            port: 5432,
            acquire_timeout_secs: 5,
            max_connections: 5,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Collector loop cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Pause between cycles, in seconds.
    pub interval_secs: u64,

    /// Pause after an unexpected fault inside a cycle, in seconds.
    pub fault_backoff_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            fault_backoff_secs: 60,
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port for probes, metrics and the query API.
    pub port: u16,

    /// Total time allowed per request, in seconds.
    pub request_timeout_secs: u64,

    /// Allowed CORS origins. `*` allows any origin.
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Human-readable text or one JSON object per line.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}
