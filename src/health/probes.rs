//! Probe handlers for the orchestrator.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::server::AppState;

/// Prometheus text exposition content type.
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Serialize)]
pub struct LivenessStatus {
    pub status: &'static str,
    pub phase: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReadinessStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// `GET /health`: 200 until shutdown begins, 503 afterwards.
pub async fn liveness(State(state): State<AppState>) -> Response {
    let live = state.health.is_live();
    let body = LivenessStatus {
        status: if live { "healthy" } else { "shutting down" },
        phase: state.health.phase().as_str(),
        timestamp: Utc::now(),
    };
    let status = if live {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// `GET /ready`: probes the store on every call.
pub async fn readiness(State(state): State<AppState>) -> Response {
    let reachable = state.store.health_probe().await;
    state.health.record_probe(reachable);

    let (status, body) = if reachable {
        (
            StatusCode::OK,
            ReadinessStatus {
                status: "ready",
                database: "connected",
                timestamp: Utc::now(),
            },
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ReadinessStatus {
                status: "not ready",
                database: "disconnected",
                timestamp: Utc::now(),
            },
        )
    };
    (status, Json(body)).into_response()
}

/// `GET /metrics`: current registry snapshot.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}
