//! Process health state shared by the collector and the probe handlers.
//!
//! # States
//! ```text
//! Starting → Running → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - Phase only moves forward (`fetch_max`), so a late `Running` can never
//!   undo a shutdown that already began
//! - Liveness is derived from the phase; readiness is probed per request and
//!   only the last outcome is remembered here, for logging transitions

use std::sync::atomic::{AtomicU8, Ordering};

/// Collector lifecycle phase.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CollectorPhase {
    Starting = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl From<u8> for CollectorPhase {
    fn from(val: u8) -> Self {
        match val {
            0 => CollectorPhase::Starting,
            1 => CollectorPhase::Running,
            2 => CollectorPhase::Draining,
            _ => CollectorPhase::Stopped,
        }
    }
}

impl CollectorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorPhase::Starting => "starting",
            CollectorPhase::Running => "running",
            CollectorPhase::Draining => "draining",
            CollectorPhase::Stopped => "stopped",
        }
    }
}

/// Outcome of the most recent store connectivity probe.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Unknown = 0,
    Connected = 1,
    Disconnected = 2,
}

impl From<u8> for ProbeOutcome {
    fn from(val: u8) -> Self {
        match val {
            1 => ProbeOutcome::Connected,
            2 => ProbeOutcome::Disconnected,
            _ => ProbeOutcome::Unknown,
        }
    }
}

/// Shared health flags. Cheap to read from any task.
#[derive(Debug)]
pub struct HealthState {
    phase: AtomicU8,
    last_probe: AtomicU8,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(CollectorPhase::Starting as u8),
            last_probe: AtomicU8::new(ProbeOutcome::Unknown as u8),
        }
    }

    pub fn phase(&self) -> CollectorPhase {
        CollectorPhase::from(self.phase.load(Ordering::Acquire))
    }

    /// Advance to `phase`. Moving backwards is ignored.
    pub fn set_phase(&self, phase: CollectorPhase) {
        let previous = CollectorPhase::from(self.phase.fetch_max(phase as u8, Ordering::AcqRel));
        if previous < phase {
            tracing::info!(from = previous.as_str(), to = phase.as_str(), "Collector phase changed");
        }
    }

    /// Shutdown requested: liveness turns false from here on.
    pub fn begin_draining(&self) {
        self.set_phase(CollectorPhase::Draining);
    }

    /// True until shutdown begins.
    pub fn is_live(&self) -> bool {
        self.phase() < CollectorPhase::Draining
    }

    pub fn last_probe(&self) -> ProbeOutcome {
        ProbeOutcome::from(self.last_probe.load(Ordering::Acquire))
    }

    /// Remember a readiness probe result, logging when it flips.
    pub fn record_probe(&self, reachable: bool) {
        let outcome = if reachable {
            ProbeOutcome::Connected
        } else {
            ProbeOutcome::Disconnected
        };
        let previous = ProbeOutcome::from(self.last_probe.swap(outcome as u8, Ordering::AcqRel));
        if previous != outcome {
            match outcome {
                ProbeOutcome::Connected => tracing::info!("Database reachable"),
                _ => tracing::warn!("Database unreachable"),
            }
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_live() {
        let state = HealthState::new();
        assert_eq!(state.phase(), CollectorPhase::Starting);
        assert!(state.is_live());
        assert_eq!(state.last_probe(), ProbeOutcome::Unknown);
    }

    #[test]
    fn test_draining_ends_liveness() {
        let state = HealthState::new();
        state.set_phase(CollectorPhase::Running);
        assert!(state.is_live());

        state.begin_draining();
        assert!(!state.is_live());
        assert_eq!(state.phase(), CollectorPhase::Draining);
    }

    #[test]
    fn test_phase_never_moves_backwards() {
        let state = HealthState::new();
        state.begin_draining();
        state.set_phase(CollectorPhase::Running);
        assert_eq!(state.phase(), CollectorPhase::Draining);

        state.set_phase(CollectorPhase::Stopped);
        state.set_phase(CollectorPhase::Draining);
        assert_eq!(state.phase(), CollectorPhase::Stopped);
    }

    #[test]
    fn test_probe_outcome_tracks_latest() {
        let state = HealthState::new();
        state.record_probe(false);
        assert_eq!(state.last_probe(), ProbeOutcome::Disconnected);
        state.record_probe(true);
        assert_eq!(state.last_probe(), ProbeOutcome::Connected);
        // Liveness is independent of readiness.
        assert!(state.is_live());
    }
}
