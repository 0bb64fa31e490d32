//! Weather monitor library.
//!
//! Periodically fetches current conditions for one location, stores each
//! observation, and serves the history with health, readiness and metrics
//! probes.

pub mod api;
pub mod collector;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod storage;

pub use config::schema::MonitorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
