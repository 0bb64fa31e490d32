//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Collector / signal watcher
//!     → state.rs (phase: Starting → Running → Draining → Stopped)
//!
//! Orchestrator
//!     → GET /health  → probes.rs reads phase        → 200 | 503
//!     → GET /ready   → probes.rs runs store probe   → 200 | 503
//!     → GET /metrics → probes.rs renders registry   → text exposition
//! ```
//!
//! # Design Decisions
//! - Liveness and readiness are independent: a lost database never fails
//!   liveness, and a draining process never reports live
//! - Readiness is never cached

pub mod probes;
pub mod state;

use axum::{routing::get, Router};

use crate::http::server::AppState;
use self::probes::{liveness, metrics, readiness};

pub use state::{CollectorPhase, HealthState, ProbeOutcome};

pub fn setup_probe_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
        .with_state(state)
}
