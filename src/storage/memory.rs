//! Volatile in-process observation store.
//!
//! Same contract as the PostgreSQL store over a vector behind a lock. Used for
//! local runs (`DATABASE_URL=memory:`) and by the test suites, which flip
//! availability to simulate an unreachable database.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::observability::metrics;
use crate::storage::types::{
    clamp_limit, NewObservation, Observation, Stats, StoreError, StoreResult,
};
use crate::storage::ObservationStore;

#[derive(Default)]
struct Table {
    rows: Vec<Observation>,
    next_id: i64,
}

/// In-memory observation table.
#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail as if the backend were unreachable.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_reachable(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> StoreResult<()> {
        if !self.is_reachable() {
            metrics::record_db_error();
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn read_table<T>(&self, f: impl FnOnce(&Table) -> T) -> StoreResult<T> {
        self.check_available()?;
        let table = self
            .table
            .read()
            .map_err(|e| StoreError::Read(format!("Lock error: {}", e)))?;
        Ok(f(&table))
    }

    /// Rows at or after `since`, newest first.
    fn window(table: &Table, since: DateTime<Utc>) -> Vec<&Observation> {
        let mut rows: Vec<&Observation> =
            table.rows.iter().filter(|o| o.timestamp >= since).collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        rows
    }
}

fn summarize(values: impl Iterator<Item = f64>) -> Option<(f64, f64, f64)> {
    let (count, sum, min, max) = values.fold(
        (0usize, 0.0, f64::INFINITY, f64::NEG_INFINITY),
        |(count, sum, min, max), v| (count + 1, sum + v, min.min(v), max.max(v)),
    );
    (count > 0).then(|| (sum / count as f64, min, max))
}

/// Aggregate `rows`; `None` when empty.
fn aggregate_rows(rows: &[&Observation]) -> Option<Stats> {
    let (avg_temperature, min_temperature, max_temperature) =
        summarize(rows.iter().map(|o| o.temperature))?;
    let humidity = summarize(rows.iter().filter_map(|o| o.humidity));
    let pressure = summarize(rows.iter().filter_map(|o| o.pressure));

    Some(Stats {
        record_count: rows.len() as i64,
        avg_temperature,
        min_temperature,
        max_temperature,
        avg_humidity: humidity.map(|h| h.0),
        min_humidity: humidity.map(|h| h.1),
        max_humidity: humidity.map(|h| h.2),
        avg_pressure: pressure.map(|p| p.0),
        min_pressure: pressure.map(|p| p.1),
        max_pressure: pressure.map(|p| p.2),
        oldest_record: rows.iter().map(|o| o.timestamp).min()?,
        newest_record: rows.iter().map(|o| o.timestamp).max()?,
    })
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn init(&self) -> StoreResult<()> {
        metrics::record_db_operation("init");
        self.check_available()
            .map_err(|e| StoreError::Init(e.to_string()))
    }

    async fn insert(&self, observation: NewObservation) -> StoreResult<Observation> {
        metrics::record_db_operation("insert");
        self.check_available()
            .map_err(|e| StoreError::Write(e.to_string()))?;

        let mut table = self
            .table
            .write()
            .map_err(|e| StoreError::Write(format!("Lock error: {}", e)))?;
        table.next_id += 1;
        let stored = Observation::from_new(table.next_id, observation);
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn latest(&self) -> StoreResult<Option<Observation>> {
        metrics::record_db_operation("latest");
        self.read_table(|table| {
            table
                .rows
                .iter()
                .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
                .cloned()
        })
    }

    async fn range(&self, since: DateTime<Utc>, limit: u32) -> StoreResult<Vec<Observation>> {
        metrics::record_db_operation("range");
        let limit = clamp_limit(limit) as usize;
        self.read_table(|table| {
            Self::window(table, since)
                .into_iter()
                .take(limit)
                .cloned()
                .collect()
        })
    }

    async fn aggregate(&self, since: DateTime<Utc>) -> StoreResult<Option<Stats>> {
        metrics::record_db_operation("aggregate");
        self.read_table(|table| aggregate_rows(&Self::window(table, since)))
    }

    async fn health_probe(&self) -> bool {
        self.is_reachable()
    }
}
