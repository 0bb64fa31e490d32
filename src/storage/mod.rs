//! Observation storage subsystem.
//!
//! # Data Flow
//! ```text
//! Write path (collector):
//!     NewObservation → ObservationStore::insert → weather_data row (id assigned)
//!
//! Read path (query API):
//!     latest / range / aggregate → Observation, Vec<Observation>, Stats
//!
//! Readiness (probe router):
//!     health_probe → trivial round-trip, never used by the paths above
//! ```
//!
//! # Design Decisions
//! - One table, append-only; rows are never updated or deleted here
//! - Atomicity is delegated to the backend's single-statement insert
//! - Rows are decoded into typed records at this boundary
//! - Rounding of aggregates happens at the API boundary, not here

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod memory;
pub mod postgres;
pub mod types;

pub use memory::MemoryStore;
pub use postgres::PgObservationStore;
pub use types::{
    clamp_limit, Location, NewObservation, Observation, Stats, StoreError, StoreErrorKind,
    StoreResult, DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT,
};

use crate::config::{DatabaseConfig, StorageBackend};

/// Durable table of weather observations.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Ensure the backing table exists. Idempotent.
    async fn init(&self) -> StoreResult<()>;

    /// Append one observation atomically and return it with its assigned id.
    async fn insert(&self, observation: NewObservation) -> StoreResult<Observation>;

    /// Most recent observation by timestamp.
    async fn latest(&self) -> StoreResult<Option<Observation>>;

    /// Observations at or after `since`, newest first, at most `clamp_limit(limit)` rows.
    async fn range(&self, since: DateTime<Utc>, limit: u32) -> StoreResult<Vec<Observation>>;

    /// Aggregates over rows at or after `since`; `None` when no rows match.
    async fn aggregate(&self, since: DateTime<Utc>) -> StoreResult<Option<Stats>>;

    /// Lightweight connectivity check for readiness.
    async fn health_probe(&self) -> bool;
}

/// Build the store selected by `config`. Connection happens lazily.
pub fn connect(config: &DatabaseConfig) -> Arc<dyn ObservationStore> {
    match config.backend {
        StorageBackend::Postgres => Arc::new(PgObservationStore::connect_lazy(config)),
        StorageBackend::Memory => {
            tracing::warn!("Using volatile in-memory observation store");
            Arc::new(MemoryStore::new())
        }
    }
}
