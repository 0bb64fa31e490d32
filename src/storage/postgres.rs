//! PostgreSQL-backed observation store.
//!
//! # Responsibilities
//! - Create the `weather_data` table and its timestamp index
//! - Detect tables left behind by an incompatible schema
//! - Map rows into typed records and sqlx errors into `StoreError`
//!
//! # Design Decisions
//! - The pool connects lazily and bounds acquisition, so an unreachable
//!   database turns into a fast error rather than a hung request
//! - Each insert is a single statement; Postgres autocommit makes it atomic

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::FromRow;

use crate::config::DatabaseConfig;
use crate::observability::metrics;
use crate::storage::types::{
    clamp_limit, Location, NewObservation, Observation, Stats, StoreError, StoreResult,
};
use crate::storage::ObservationStore;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_data (
        id BIGSERIAL PRIMARY KEY,
        temperature DOUBLE PRECISION NOT NULL,
        humidity DOUBLE PRECISION,
        pressure DOUBLE PRECISION,
        timestamp TIMESTAMPTZ NOT NULL,
        city VARCHAR(100) NOT NULL,
        country VARCHAR(100) NOT NULL
    )
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS weather_data_timestamp_idx ON weather_data (timestamp DESC)";

const TABLE_COLUMNS: &str = r#"
    SELECT column_name::TEXT, data_type::TEXT
    FROM information_schema.columns
    WHERE table_schema = current_schema() AND table_name = 'weather_data'
"#;

const SELECT_COLUMNS: &str =
    "SELECT id::BIGINT AS id, temperature, humidity, pressure, timestamp, city, country FROM weather_data";

/// Columns the store reads and writes, with the type each must have.
const EXPECTED_COLUMNS: &[(&str, Option<&str>)] = &[
    ("id", None),
    ("temperature", Some("double precision")),
    ("humidity", Some("double precision")),
    ("pressure", Some("double precision")),
    ("timestamp", Some("timestamp with time zone")),
    ("city", None),
    ("country", None),
];

#[derive(Debug, FromRow)]
struct ObservationRow {
    id: i64,
    temperature: f64,
    humidity: Option<f64>,
    pressure: Option<f64>,
    timestamp: DateTime<Utc>,
    city: String,
    country: String,
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Observation {
            id: row.id,
            temperature: row.temperature,
            humidity: row.humidity,
            pressure: row.pressure,
            timestamp: row.timestamp,
            location: Location {
                city: row.city,
                country: row.country,
            },
        }
    }
}

/// The single row an aggregate query returns. All-null when nothing matched.
#[derive(Debug, Default, FromRow)]
struct StatsRow {
    record_count: i64,
    avg_temperature: Option<f64>,
    min_temperature: Option<f64>,
    max_temperature: Option<f64>,
    avg_humidity: Option<f64>,
    min_humidity: Option<f64>,
    max_humidity: Option<f64>,
    avg_pressure: Option<f64>,
    min_pressure: Option<f64>,
    max_pressure: Option<f64>,
    oldest_record: Option<DateTime<Utc>>,
    newest_record: Option<DateTime<Utc>>,
}

impl StatsRow {
    /// `None` when the window matched no rows.
    fn into_stats(self) -> Option<Stats> {
        if self.record_count == 0 {
            return None;
        }
        Some(Stats {
            record_count: self.record_count,
            avg_temperature: self.avg_temperature?,
            min_temperature: self.min_temperature?,
            max_temperature: self.max_temperature?,
            avg_humidity: self.avg_humidity,
            min_humidity: self.min_humidity,
            max_humidity: self.max_humidity,
            avg_pressure: self.avg_pressure,
            min_pressure: self.min_pressure,
            max_pressure: self.max_pressure,
            oldest_record: self.oldest_record?,
            newest_record: self.newest_record?,
        })
    }
}

/// Observation store on a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgObservationStore {
    pool: PgPool,
}

impl PgObservationStore {
    /// Build a lazily connected pool. No I/O happens until the first query.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            "PostgreSQL pool configured"
        );

        Self { pool }
    }

    async fn check_schema(&self) -> StoreResult<()> {
        let columns: Vec<(String, String)> = sqlx::query_as(TABLE_COLUMNS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Init(e.to_string()))?;

        let problems = schema_problems(&columns);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(StoreError::SchemaConflict { problems })
        }
    }
}

/// Compare the live column list against `EXPECTED_COLUMNS`.
fn schema_problems(columns: &[(String, String)]) -> Vec<String> {
    EXPECTED_COLUMNS
        .iter()
        .filter_map(|(name, expected_type)| {
            match columns.iter().find(|(column, _)| column == name) {
                None => Some(format!("missing column {}", name)),
                Some((_, actual)) => match expected_type {
                    Some(expected) if actual != expected => Some(format!(
                        "column {} has type {}, expected {}",
                        name, actual, expected
                    )),
                    _ => None,
                },
            }
        })
        .collect()
}

fn read_error(e: sqlx::Error) -> StoreError {
    metrics::record_db_error();
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Read(other.to_string()),
    }
}

#[async_trait]
impl ObservationStore for PgObservationStore {
    async fn init(&self) -> StoreResult<()> {
        metrics::record_db_operation("init");

        let result = async {
            sqlx::query(CREATE_TABLE)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Init(e.to_string()))?;
            self.check_schema().await?;
            sqlx::query(CREATE_INDEX)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Init(e.to_string()))?;
            Ok::<(), StoreError>(())
        }
        .await;

        match &result {
            Ok(()) => tracing::info!("Database initialized successfully"),
            Err(e) => {
                metrics::record_db_error();
                tracing::error!(error = %e, "Database initialization failed");
            }
        }
        result
    }

    async fn insert(&self, observation: NewObservation) -> StoreResult<Observation> {
        metrics::record_db_operation("insert");

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO weather_data (temperature, humidity, pressure, timestamp, city, country) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id::BIGINT",
        )
        .bind(observation.temperature)
        .bind(observation.humidity)
        .bind(observation.pressure)
        .bind(observation.timestamp)
        .bind(&observation.location.city)
        .bind(&observation.location.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            metrics::record_db_error();
            StoreError::Write(e.to_string())
        })?;

        Ok(Observation::from_new(id, observation))
    }

    async fn latest(&self) -> StoreResult<Option<Observation>> {
        metrics::record_db_operation("latest");

        let row: Option<ObservationRow> =
            sqlx::query_as(&format!("{} ORDER BY timestamp DESC, id DESC LIMIT 1", SELECT_COLUMNS))
                .fetch_optional(&self.pool)
                .await
                .map_err(read_error)?;

        Ok(row.map(Observation::from))
    }

    async fn range(&self, since: DateTime<Utc>, limit: u32) -> StoreResult<Vec<Observation>> {
        metrics::record_db_operation("range");

        let rows: Vec<ObservationRow> = sqlx::query_as(&format!(
            "{} WHERE timestamp >= $1 ORDER BY timestamp DESC, id DESC LIMIT $2",
            SELECT_COLUMNS
        ))
        .bind(since)
        .bind(i64::from(clamp_limit(limit)))
        .fetch_all(&self.pool)
        .await
        .map_err(read_error)?;

        Ok(rows.into_iter().map(Observation::from).collect())
    }

    async fn aggregate(&self, since: DateTime<Utc>) -> StoreResult<Option<Stats>> {
        metrics::record_db_operation("aggregate");

        let row: StatsRow = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS record_count,
                AVG(temperature) AS avg_temperature,
                MIN(temperature) AS min_temperature,
                MAX(temperature) AS max_temperature,
                AVG(humidity) AS avg_humidity,
                MIN(humidity) AS min_humidity,
                MAX(humidity) AS max_humidity,
                AVG(pressure) AS avg_pressure,
                MIN(pressure) AS min_pressure,
                MAX(pressure) AS max_pressure,
                MIN(timestamp) AS oldest_record,
                MAX(timestamp) AS newest_record
            FROM weather_data
            WHERE timestamp >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(read_error)?;

        Ok(row.into_stats())
    }

    async fn health_probe(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_schema_matches() {
        let live = columns(&[
            ("id", "bigint"),
            ("temperature", "double precision"),
            ("humidity", "double precision"),
            ("pressure", "double precision"),
            ("timestamp", "timestamp with time zone"),
            ("city", "character varying"),
            ("country", "character varying"),
        ]);
        assert!(schema_problems(&live).is_empty());
    }

    #[test]
    fn test_schema_without_location_conflicts() {
        let live = columns(&[
            ("id", "integer"),
            ("temperature", "double precision"),
            ("humidity", "double precision"),
            ("pressure", "double precision"),
            ("timestamp", "timestamp without time zone"),
        ]);
        let problems = schema_problems(&live);
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p == "missing column city"));
        assert!(problems.iter().any(|p| p == "missing column country"));
        assert!(problems.iter().any(|p| p.starts_with("column timestamp has type")));
    }

    #[test]
    fn test_empty_aggregate_is_no_data() {
        assert!(StatsRow::default().into_stats().is_none());
    }

    #[test]
    fn test_aggregate_row_with_nullable_columns() {
        let now = Utc::now();
        let stats = StatsRow {
            record_count: 2,
            avg_temperature: Some(20.0),
            min_temperature: Some(19.0),
            max_temperature: Some(21.0),
            oldest_record: Some(now),
            newest_record: Some(now),
            ..Default::default()
        }
        .into_stats()
        .unwrap();
        assert_eq!(stats.record_count, 2);
        assert!(stats.avg_humidity.is_none());
        assert!(stats.max_pressure.is_none());
    }

    #[tokio::test]
    async fn test_probe_fails_when_unreachable() {
        let config = DatabaseConfig {
            host: "127.0.0.1".into(),
            port: 1,
            acquire_timeout_secs: 1,
            ..Default::default()
        };
        let store = PgObservationStore::connect_lazy(&config);
        assert!(!store.health_probe().await);
    }
}
