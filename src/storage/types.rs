//! Observation records and storage error definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest page a range query may return.
pub const MIN_LIMIT: u32 = 1;
/// Largest page a range query may return.
pub const MAX_LIMIT: u32 = 1000;

/// Row cap used when a caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 100;

/// Clamp a requested row limit to `[MIN_LIMIT, MAX_LIMIT]`.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Where an observation was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// A reading that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObservation {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: Option<f64>,
    /// Millibar.
    pub pressure: Option<f64>,
    /// Set by the collector when the fetch completes.
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub location: Location,
}

/// A stored reading. Immutable once the store has assigned its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub location: Location,
}

impl Observation {
    pub fn from_new(id: i64, new: NewObservation) -> Self {
        Self {
            id,
            temperature: new.temperature,
            humidity: new.humidity,
            pressure: new.pressure,
            timestamp: new.timestamp,
            location: new.location,
        }
    }

    /// The fields the caller supplied, without the store-assigned id.
    pub fn to_new(&self) -> NewObservation {
        NewObservation {
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            timestamp: self.timestamp,
            location: self.location.clone(),
        }
    }
}

/// Aggregates over a window that matched at least one row.
///
/// Humidity and pressure are nullable columns, so their aggregates are absent
/// when every matching row left them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub record_count: i64,
    pub avg_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub avg_humidity: Option<f64>,
    pub min_humidity: Option<f64>,
    pub max_humidity: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub min_pressure: Option<f64>,
    pub max_pressure: Option<f64>,
    pub oldest_record: DateTime<Utc>,
    pub newest_record: DateTime<Utc>,
}

/// Which store operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Init,
    Write,
    Read,
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Table creation or connection during startup failed.
    #[error("store initialization failed: {0}")]
    Init(String),

    /// The existing table does not match the expected columns.
    #[error("schema conflict on weather_data: {}", .problems.join("; "))]
    SchemaConflict { problems: Vec<String> },

    /// An insert did not persist.
    #[error("write failed: {0}")]
    Write(String),

    /// A query failed.
    #[error("read failed: {0}")]
    Read(String),

    /// The backend could not be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Init(_) | StoreError::SchemaConflict { .. } => StoreErrorKind::Init,
            StoreError::Write(_) => StoreErrorKind::Write,
            StoreError::Read(_) | StoreError::Unavailable(_) => StoreErrorKind::Read,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
