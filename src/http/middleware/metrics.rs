//! Request metrics middleware.
//!
//! Records `api_requests_total` and `api_request_duration_seconds` for every
//! request, whatever the outcome. The endpoint label is the matched route
//! template so path parameters and probes of unknown URLs cannot blow up label
//! cardinality.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// Label used when no route matched.
pub const UNMATCHED: &str = "unmatched";

pub async fn track_requests(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED.to_string());

    let response = next.run(req).await;

    metrics::record_request(&method, &endpoint, response.status().as_u16(), start);
    response
}
