//! The fetch-then-store loop.
//!
//! # Responsibilities
//! - Run one cycle per interval: fetch a snapshot, then persist it
//! - Contain every fetch and store failure inside its cycle
//! - Back off after an unexpected fault instead of exiting
//! - Leave the sleep as soon as shutdown is requested
//!
//! # Design Decisions
//! - A cycle in flight is never cancelled; shutdown is only observed
//!   between cycles
//! - Cycles are strictly sequential; one collector per process

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;

use crate::config::CollectorConfig;
use crate::health::{CollectorPhase, HealthState};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::provider::WeatherSource;
use crate::storage::{Observation, ObservationStore};

/// How a single cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Stored(Observation),
    FetchFailed,
    StoreFailed,
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Stored(_) => "stored",
            CycleOutcome::FetchFailed => "fetch_error",
            CycleOutcome::StoreFailed => "store_error",
        }
    }
}

/// Periodic collector driving a `WeatherSource` into an `ObservationStore`.
pub struct Collector {
    source: Arc<dyn WeatherSource>,
    store: Arc<dyn ObservationStore>,
    health: Arc<HealthState>,
    interval: Duration,
    fault_backoff: Duration,
}

impl Collector {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        store: Arc<dyn ObservationStore>,
        health: Arc<HealthState>,
        config: &CollectorConfig,
    ) -> Self {
        Self {
            source,
            store,
            health,
            interval: Duration::from_secs(config.interval_secs),
            fault_backoff: Duration::from_secs(config.fault_backoff_secs),
        }
    }

    /// Run one fetch-then-store cycle. Failures are logged, never returned.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let observation = match self.source.fetch().await {
            Ok(observation) => observation,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    transient = e.is_transient(),
                    "Cycle skipped: fetch failed"
                );
                return CycleOutcome::FetchFailed;
            }
        };

        match self.store.insert(observation).await {
            Ok(stored) => {
                tracing::info!(
                    id = stored.id,
                    temperature = stored.temperature,
                    humidity = ?stored.humidity,
                    pressure = ?stored.pressure,
                    location = %stored.location,
                    "Weather data stored"
                );
                CycleOutcome::Stored(stored)
            }
            Err(e) => {
                tracing::error!(error = %e, kind = ?e.kind(), "Cycle abandoned: store failed");
                CycleOutcome::StoreFailed
            }
        }
    }

    /// Run until `shutdown` fires. Marks the phase `Running` on entry and
    /// `Stopped` on exit.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        self.health.set_phase(CollectorPhase::Running);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            location = %self.source.location(),
            "Collector starting"
        );

        loop {
            if shutdown.is_triggered() {
                break;
            }

            let pause = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                Ok(outcome) => {
                    metrics::record_cycle(outcome.label());
                    self.interval
                }
                Err(payload) => {
                    metrics::record_cycle("fault");
                    tracing::error!(
                        fault = %panic_message(payload.as_ref()),
                        backoff_secs = self.fault_backoff.as_secs(),
                        "Unexpected fault in collector cycle, backing off"
                    );
                    self.fault_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Collector received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        self.health.set_phase(CollectorPhase::Stopped);
        tracing::info!("Collector stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown fault".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::provider::FetchError;
    use crate::storage::{Location, MemoryStore, NewObservation};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    enum Step {
        Reading(f64),
        Fail,
        Fault,
    }

    /// Source that plays back scripted steps, then keeps returning 20.0.
    struct ScriptedSource {
        location: Location,
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                location: Location::new("Mississauga", "Canada"),
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherSource for ScriptedSource {
        fn location(&self) -> &Location {
            &self.location
        }

        async fn fetch(&self) -> Result<NewObservation, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().unwrap().pop_front();
            let temperature = match step.unwrap_or(Step::Reading(20.0)) {
                Step::Reading(t) => t,
                Step::Fail => {
                    return Err(FetchError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
                }
                Step::Fault => panic!("scripted fault"),
            };
            Ok(NewObservation {
                temperature,
                humidity: Some(55.0),
                pressure: Some(1012.0),
                timestamp: Utc::now(),
                location: self.location.clone(),
            })
        }
    }

    struct Harness {
        source: Arc<ScriptedSource>,
        store: Arc<MemoryStore>,
        health: Arc<HealthState>,
        shutdown: Shutdown,
        handle: tokio::task::JoinHandle<()>,
    }

    fn spawn(steps: Vec<Step>) -> Harness {
        let source = ScriptedSource::new(steps);
        let store = Arc::new(MemoryStore::new());
        let health = Arc::new(HealthState::new());
        let shutdown = Shutdown::new();

        let collector = Collector::new(
            source.clone(),
            store.clone(),
            health.clone(),
            &CollectorConfig::default(),
        );
        let handle = tokio::spawn(collector.run(shutdown.subscribe()));

        Harness {
            source,
            store,
            health,
            shutdown,
            handle,
        }
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test]
    async fn test_cycle_stores_one_row() {
        let source = ScriptedSource::new(vec![Step::Reading(22.5)]);
        let store = Arc::new(MemoryStore::new());
        let collector = Collector::new(
            source,
            store.clone(),
            Arc::new(HealthState::new()),
            &CollectorConfig::default(),
        );

        let outcome = collector.run_cycle().await;
        assert_eq!(outcome.label(), "stored");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_with_unreachable_store_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let collector = Collector::new(
            ScriptedSource::new(vec![]),
            store.clone(),
            Arc::new(HealthState::new()),
            &CollectorConfig::default(),
        );

        assert_eq!(collector.run_cycle().await, CycleOutcome::StoreFailed);
        store.set_available(true);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_does_not_stop_next_cycle() {
        let h = spawn(vec![Step::Fail, Step::Reading(21.0)]);

        advance(1).await;
        assert_eq!(h.source.calls(), 1);
        assert!(h.store.is_empty());
        assert_eq!(h.health.phase(), CollectorPhase::Running);

        advance(298).await;
        assert_eq!(h.source.calls(), 1, "next cycle must wait for the full interval");

        advance(2).await;
        assert_eq!(h.source.calls(), 2);
        assert_eq!(h.store.len(), 1);
    }

    /// Source whose fetch parks until released.
    struct GatedSource {
        location: Location,
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherSource for GatedSource {
        fn location(&self) -> &Location {
            &self.location
        }

        async fn fetch(&self) -> Result<NewObservation, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(NewObservation {
                temperature: 17.5,
                humidity: None,
                pressure: None,
                timestamp: Utc::now(),
                location: self.location.clone(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_lets_in_flight_cycle_finish() {
        let source = Arc::new(GatedSource {
            location: Location::new("Mississauga", "Canada"),
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryStore::new());
        let health = Arc::new(HealthState::new());
        let shutdown = Shutdown::new();

        let collector = Collector::new(
            source.clone(),
            store.clone(),
            health.clone(),
            &CollectorConfig::default(),
        );
        let handle = tokio::spawn(collector.run(shutdown.subscribe()));

        source.entered.notified().await;
        health.begin_draining();
        shutdown.trigger();

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!handle.is_finished());
        assert!(store.is_empty());
        assert_eq!(health.phase(), CollectorPhase::Draining);

        source.release.notify_one();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("collector should stop once the cycle completes")
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(health.phase(), CollectorPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_is_isolated_per_cycle() {
        let h = spawn(vec![]);
        h.store.set_available(false);

        advance(1).await;
        assert_eq!(h.source.calls(), 1);

        h.store.set_available(true);
        advance(300).await;
        assert_eq!(h.source.calls(), 2);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_backs_off_then_resumes() {
        let h = spawn(vec![Step::Fault, Step::Reading(19.0)]);

        advance(59).await;
        assert_eq!(h.source.calls(), 1);
        assert!(h.store.is_empty());
        assert!(!h.handle.is_finished());

        advance(2).await;
        assert_eq!(h.source.calls(), 2);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_sleep() {
        let h = spawn(vec![]);

        advance(10).await;
        assert_eq!(h.source.calls(), 1);

        h.health.begin_draining();
        h.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), h.handle)
            .await
            .expect("collector should stop within a second")
            .unwrap();

        assert_eq!(h.health.phase(), CollectorPhase::Stopped);
        assert_eq!(h.source.calls(), 1);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_start_runs_no_cycle() {
        let source = ScriptedSource::new(vec![]);
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let collector = Collector::new(
            source.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(HealthState::new()),
            &CollectorConfig::default(),
        );
        collector.run(shutdown.subscribe()).await;
        assert_eq!(source.calls(), 0);
    }
}
