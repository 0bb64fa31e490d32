//! Read-only query API over stored observations.
//!
//! # Data Flow
//! ```text
//! GET /api/weather/current             → ObservationStore::latest    → 200 | 404
//! GET /api/weather/history?hours&limit → ObservationStore::range     → 200 [..]
//! GET /api/weather/stats?hours         → ObservationStore::aggregate → 200 | 404
//! ```
//!
//! # Design Decisions
//! - Handlers hold no state of their own; everything goes through the store
//! - Store failures surface as 500 with the cause in `message`

pub mod handlers;
pub mod params;

use axum::{routing::get, Router};

use crate::http::server::AppState;
use self::handlers::*;

pub fn setup_api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/weather/current", get(current))
        .route("/api/weather/history", get(history))
        .route("/api/weather/stats", get(stats))
        .with_state(state)
}
