//! WeatherAPI.com client.
//!
//! # Responsibilities
//! - Request current conditions for the configured location
//! - Convert the provider payload into a `NewObservation`
//! - Classify failures as transient (transport, status) or malformed
//!
//! # Design Decisions
//! - One attempt per call; the collector owns retry policy
//! - The credential never appears in logs or error messages

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::config::{ConfigError, ProviderConfig};
use crate::observability::metrics;
use crate::provider::types::{CurrentResponse, FetchError};
use crate::provider::WeatherSource;
use crate::storage::{Location, NewObservation};

/// Client for the provider's current-conditions endpoint.
#[derive(Clone)]
pub struct WeatherApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    location: Location,
}

impl std::fmt::Debug for WeatherApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiClient")
            .field("endpoint", &self.endpoint)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl WeatherApiClient {
    /// Build a client. Fails if the credential is absent.
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("WEATHER_API_KEY"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/current.json", config.base_url.trim_end_matches('/')),
            api_key,
            location: Location::new(config.city.clone(), config.country.clone()),
        })
    }

    /// Provider query string for the location, e.g. `Mississauga,Canada`.
    pub fn query(&self) -> String {
        format!("{},{}", self.location.city, self.location.country)
    }

    async fn request(&self) -> Result<NewObservation, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", self.api_key.as_str()), ("q", self.query().as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.without_url()))?;
        let body: CurrentResponse = serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        into_observation(body, &self.location, Utc::now())
    }
}

/// Extract the stored fields from a provider payload.
pub fn into_observation(
    body: CurrentResponse,
    location: &Location,
    fetched_at: DateTime<Utc>,
) -> Result<NewObservation, FetchError> {
    let current = body
        .current
        .ok_or_else(|| FetchError::Malformed("missing 'current' object".to_string()))?;
    let temperature = current
        .temp_c
        .filter(|t| t.is_finite())
        .ok_or_else(|| FetchError::Malformed("missing or invalid 'current.temp_c'".to_string()))?;

    Ok(NewObservation {
        temperature,
        humidity: current.humidity.filter(|h| h.is_finite()),
        pressure: current.pressure_mb.filter(|p| p.is_finite()),
        timestamp: fetched_at,
        location: location.clone(),
    })
}

#[async_trait]
impl WeatherSource for WeatherApiClient {
    fn location(&self) -> &Location {
        &self.location
    }

    async fn fetch(&self) -> Result<NewObservation, FetchError> {
        metrics::record_fetch_attempt();
        let start = Instant::now();

        let result = self.request().await;
        match &result {
            Ok(observation) => {
                metrics::record_fetch_duration(start);
                metrics::record_conditions(
                    &self.location.city,
                    &self.location.country,
                    observation.temperature,
                    observation.humidity,
                    observation.pressure,
                );
            }
            Err(e) => {
                metrics::record_fetch_error();
                tracing::warn!(
                    error = %e,
                    transient = e.is_transient(),
                    location = %self.location,
                    "Failed to fetch weather data"
                );
            }
        }
        result
    }
}
