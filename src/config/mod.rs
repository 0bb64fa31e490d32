//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (WEATHER_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (WEATHER_API_KEY, DATABASE_URL, UPDATE_INTERVAL, ...)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → handed by value to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults, so an empty environment is a valid start
//! - The provider credential is checked by the provider client, not here

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CollectorConfig, DatabaseConfig, LogFormat, MonitorConfig, ObservabilityConfig,
    ProviderConfig, ServerConfig, StorageBackend,
};
pub use validation::{validate_config, ValidationError};
