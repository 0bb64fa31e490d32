//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics recorder
//! - Initialize the store and construct the provider client
//! - Bind the listener, then start the collector and HTTP server
//! - Drive the ordered shutdown once a stop signal arrives
//!
//! # Design Decisions
//! - Fail fast: any STARTING error is fatal and returned to `main`
//! - Subsystems initialize in order, not concurrently
//! - Shutdown order: mark draining, let the collector finish its cycle,
//!   then stop the HTTP server so probes report draining until the end

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::collector::Collector;
use crate::config::{ConfigError, MonitorConfig};
use crate::health::HealthState;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::signals::wait_for_signal;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::provider::{WeatherApiClient, WeatherSource};
use crate::storage::{self, ObservationStore, StoreError};

const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Fatal failures while STARTING, plus a server that dies while running.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Everything the running phase needs, already initialized.
pub struct Services {
    pub store: Arc<dyn ObservationStore>,
    pub source: Arc<dyn WeatherSource>,
    pub health: Arc<HealthState>,
    pub metrics: PrometheusHandle,
}

/// Start the monitor and run until SIGTERM or SIGINT.
pub async fn run(config: MonitorConfig) -> Result<(), StartupError> {
    let metrics_handle = metrics::init_metrics();
    spawn_metrics_upkeep(metrics_handle.clone());

    let store = storage::connect(&config.database);
    store.init().await?;

    let source: Arc<dyn WeatherSource> = Arc::new(WeatherApiClient::new(&config.provider)?);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let services = Services {
        store,
        source,
        health: Arc::new(HealthState::new()),
        metrics: metrics_handle,
    };

    serve_until(&config, listener, services, async {
        let signal = wait_for_signal().await;
        tracing::info!(signal = %signal, "Shutdown signal received");
    })
    .await
}

/// Run the collector and HTTP server on `listener` until `stop` resolves,
/// then shut both down in order.
pub async fn serve_until<F>(
    config: &MonitorConfig,
    listener: TcpListener,
    services: Services,
    stop: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send,
{
    let Services {
        store,
        source,
        health,
        metrics,
    } = services;

    let collector_shutdown = Shutdown::new();
    let server_shutdown = Shutdown::new();

    let collector = Collector::new(source, store.clone(), health.clone(), &config.collector);
    let collector_task = tokio::spawn(collector.run(collector_shutdown.subscribe()));

    let server = HttpServer::new(config.server.clone(), AppState::new(store, health.clone(), metrics));
    let mut server_task = tokio::spawn(server.run(listener, server_shutdown.subscribe()));

    let early_exit = tokio::select! {
        _ = stop => None,
        result = &mut server_task => Some(result),
    };

    health.begin_draining();
    collector_shutdown.trigger();
    if let Err(e) = collector_task.await {
        tracing::error!(error = %e, "Collector task ended abnormally");
    }

    let server_result = match early_exit {
        Some(result) => result,
        None => {
            server_shutdown.trigger();
            server_task.await
        }
    };

    match server_result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(StartupError::Server(e)),
        Err(e) => {
            tracing::error!(error = %e, "HTTP server task ended abnormally");
            Err(StartupError::Server(std::io::Error::other(e.to_string())))
        }
    }
}

/// Histograms are only drained when upkeep runs.
fn spawn_metrics_upkeep(handle: PrometheusHandle) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(METRICS_UPKEEP_INTERVAL);
        loop {
            ticker.tick().await;
            handle.run_upkeep();
        }
    });
}
