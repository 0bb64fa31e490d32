//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → GET /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of interpolated messages
//! - One recorder per process, rendered on demand by the probe router
//! - Metric updates are cheap (atomic operations)

pub mod logging;
pub mod metrics;
