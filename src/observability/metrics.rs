//! Metrics collection and exposition.
//!
//! # Metrics
//! - `weather_api_requests_total` (counter): provider fetch attempts
//! - `weather_api_errors_total` (counter): failed provider fetches
//! - `weather_fetch_duration_seconds` (histogram): successful fetch latency
//! - `current_{temperature_celsius,humidity_percent,pressure_mb}` (gauges): last reading
//! - `db_operations_total` (counter): store calls by operation
//! - `db_errors_total` (counter): failed store calls
//! - `collector_cycles_total` (counter): cycles by outcome
//! - `api_requests_total` (counter): HTTP requests by method, endpoint, status
//! - `api_request_duration_seconds` (histogram): HTTP latency by method, endpoint

use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and return a handle for rendering.
///
/// Safe to call more than once; later calls return the first handle.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE.get_or_init(install_recorder).clone()
}

fn install_recorder() -> PrometheusHandle {
    let builder = match PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), LATENCY_BUCKETS)
    {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid histogram buckets, using summaries");
            PrometheusBuilder::new()
        }
    };

    let recorder = builder.build_recorder();
    let handle = recorder.handle();

    if let Err(e) = metrics::set_global_recorder(recorder) {
        tracing::warn!(error = %e, "Metrics recorder already installed");
    } else {
        describe_metrics();
        tracing::debug!("Prometheus recorder installed");
    }

    handle
}

fn describe_metrics() {
    describe_counter!("weather_api_requests_total", "Total number of weather API requests");
    describe_counter!("weather_api_errors_total", "Total number of weather API errors");
    describe_histogram!("weather_fetch_duration_seconds", "Time spent fetching weather data");
    describe_gauge!("current_temperature_celsius", "Current temperature in Celsius");
    describe_gauge!("current_humidity_percent", "Current humidity percentage");
    describe_gauge!("current_pressure_mb", "Current atmospheric pressure in millibars");
    describe_counter!("db_operations_total", "Total number of database operations");
    describe_counter!("db_errors_total", "Total number of database errors");
    describe_counter!("collector_cycles_total", "Collector cycles by outcome");
    describe_counter!("api_requests_total", "Total number of API requests");
    describe_histogram!("api_request_duration_seconds", "API request duration in seconds");
}

pub fn record_fetch_attempt() {
    counter!("weather_api_requests_total").increment(1);
}

pub fn record_fetch_error() {
    counter!("weather_api_errors_total").increment(1);
}

pub fn record_fetch_duration(start: Instant) {
    histogram!("weather_fetch_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Publish the latest reading for a location.
pub fn record_conditions(
    city: &str,
    country: &str,
    temperature: f64,
    humidity: Option<f64>,
    pressure: Option<f64>,
) {
    let labels = [("city", city.to_string()), ("country", country.to_string())];
    gauge!("current_temperature_celsius", &labels[..]).set(temperature);
    if let Some(h) = humidity {
        gauge!("current_humidity_percent", &labels[..]).set(h);
    }
    if let Some(p) = pressure {
        gauge!("current_pressure_mb", &labels[..]).set(p);
    }
}

pub fn record_db_operation(operation: &'static str) {
    counter!("db_operations_total", "operation" => operation).increment(1);
}

pub fn record_db_error() {
    counter!("db_errors_total").increment(1);
}

pub fn record_cycle(outcome: &'static str) {
    counter!("collector_cycles_total", "outcome" => outcome).increment(1);
}

/// Record one HTTP request.
pub fn record_request(method: &str, endpoint: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let endpoint = endpoint.to_string();
    counter!(
        "api_requests_total",
        "method" => method.clone(),
        "endpoint" => endpoint.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "api_request_duration_seconds",
        "method" => method,
        "endpoint" => endpoint
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_and_renders() {
        let first = init_metrics();
        let second = init_metrics();

        record_request("GET", "/health", 200, Instant::now());
        record_db_operation("insert");

        let rendered = second.render();
        assert!(rendered.contains("api_requests_total"));
        assert!(rendered.contains("db_operations_total"));
        assert_eq!(first.render().is_empty(), rendered.is_empty());
    }
}
