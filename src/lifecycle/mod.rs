//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Metrics → Store init → Provider client → Bind → Collector + HTTP server
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop future resolves
//!
//! Shutdown (shutdown.rs):
//!     Mark draining → Collector finishes cycle → HTTP server drains → Exit 0
//! ```
//!
//! # Design Decisions
//! - Ordered startup: store and credential first, listener last
//! - Any STARTING failure is fatal (exit code 1)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::{wait_for_signal, StopSignal};
pub use startup::{run, serve_until, Services, StartupError};
