//! Collection subsystem.
//!
//! # Data Flow
//! ```text
//! Collector::run
//!     loop:
//!         WeatherSource::fetch ──err──▶ log, skip cycle
//!             │ ok
//!             ▼
//!         ObservationStore::insert ──err──▶ log, skip cycle
//!             │
//!             ▼
//!         sleep(interval) | shutdown ──▶ exit
//!
//!     panic inside a cycle ──▶ log, sleep(fault_backoff), continue
//! ```

pub mod worker;

pub use worker::{Collector, CycleOutcome};
