//! Provider response shape and fetch errors.

use serde::Deserialize;
use thiserror::Error;

/// Body of a WeatherAPI.com `current.json` response. Only the fields we store.
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure_mb: Option<f64>,
}

/// Errors that can occur while fetching a snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body transfer failed.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// Provider answered with a non-2xx status.
    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),

    /// Provider answered 2xx but the payload lacks required fields.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Transient failures are expected to clear on a later cycle.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::Malformed(_))
    }
}
