//! Weather provider access.
//!
//! # Data Flow
//! ```text
//! Collector tick
//!   → WeatherSource::fetch()
//!       → GET {base_url}/current.json?key=..&q=City,Country
//!       → CurrentResponse (serde)
//!       → NewObservation { temperature, humidity, pressure, timestamp, location }
//!   → ObservationStore::insert()
//! ```
//!
//! # Design Decisions
//! - `WeatherSource` is the seam the collector depends on, so tests can
//!   script provider behavior without a network
//! - The timestamp is taken when the fetch completes, not from the provider

pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::storage::{Location, NewObservation};

pub use client::WeatherApiClient;
pub use types::{CurrentConditions, CurrentResponse, FetchError};

/// Source of current-conditions snapshots for one location.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Location every snapshot is attributed to.
    fn location(&self) -> &Location;

    /// Fetch one snapshot. A single attempt, bounded by the client timeout.
    async fn fetch(&self) -> Result<NewObservation, FetchError>;
}
