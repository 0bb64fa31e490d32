//! Weather monitor service.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌───────────────────────────── weather-monitor ─────────────────────────────┐
//!   │                                                                           │
//!   │  ┌───────────┐  fetch   ┌───────────┐  insert   ┌──────────────────────┐  │
//!   │  │ collector │─────────▶│ provider  │           │       storage        │  │
//!   │  │   loop    │──────────┼───────────┼──────────▶│ Postgres | in-memory │  │
//!   │  └─────┬─────┘          └─────┬─────┘           └──────────▲───────────┘  │
//!   │        │ phase                │                            │ read         │
//!   │        ▼                      ▼                            │              │
//!   │  ┌───────────┐         WeatherAPI.com              ┌───────┴───────┐      │
//!   │  │  health   │◀──── /health /ready /metrics ───────│  http server  │◀─────┼── clients
//!   │  │  state    │                                     │  + query api  │      │
//!   │  └───────────┘                                     └───────────────┘      │
//!   │                                                                           │
//!   │  Cross-cutting: config (env + TOML), observability (tracing, Prometheus), │
//!   │  lifecycle (ordered startup, SIGTERM/SIGINT drain)                        │
//!   └───────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use weather_monitor::config::{MonitorConfig, ObservabilityConfig};
use weather_monitor::lifecycle;
use weather_monitor::observability::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match MonitorConfig::load() {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        location = %format!("{},{}", config.provider.city, config.provider.country),
        interval_secs = config.collector.interval_secs,
        port = config.server.port,
        backend = ?config.database.backend,
        "weather-monitor starting"
    );

    match lifecycle::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error, exiting");
            ExitCode::FAILURE
        }
    }
}
