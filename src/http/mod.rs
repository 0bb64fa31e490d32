//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!         SetRequestId → PropagateRequestId → Trace → metrics → CORS → Timeout
//!     → health probes (/health, /ready, /metrics)
//!     → query API (/api/weather/*)
//!     → response.rs (JSON error bodies, 404 fallback)
//!     → Send to client
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use response::{ApiError, ErrorBody};
pub use server::{AppState, HttpServer};
