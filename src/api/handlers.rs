//! Handlers for the read-only weather endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::api::params::WindowParams;
use crate::http::{ApiError, AppState};
use crate::storage::{Observation, Stats};

/// `GET /api/weather/current`
pub async fn current(State(state): State<AppState>) -> Result<Json<Observation>, ApiError> {
    state
        .store
        .latest()
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("No weather data available"))
}

/// `GET /api/weather/history?hours&limit`
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let since = params.since(Utc::now());
    let rows = state.store.range(since, params.limit()).await?;
    Ok(Json(rows))
}

/// `GET /api/weather/stats?hours`
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Stats>, ApiError> {
    let since = params.since(Utc::now());
    state
        .store
        .aggregate(since)
        .await?
        .map(|stats| Json(rounded(stats)))
        .ok_or(ApiError::NotFound(
            "No weather data available for the specified time range",
        ))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round every floating field to two decimals.
pub fn rounded(stats: Stats) -> Stats {
    Stats {
        avg_temperature: round2(stats.avg_temperature),
        min_temperature: round2(stats.min_temperature),
        max_temperature: round2(stats.max_temperature),
        avg_humidity: stats.avg_humidity.map(round2),
        min_humidity: stats.min_humidity.map(round2),
        max_humidity: stats.max_humidity.map(round2),
        avg_pressure: stats.avg_pressure.map(round2),
        min_pressure: stats.min_pressure.map(round2),
        max_pressure: stats.max_pressure.map(round2),
        ..stats
    }
}
