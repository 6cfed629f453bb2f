#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Concurrent requester simulation for banker
//!
//! Drives one tokio task per requester against a shared
//! [`ResourceManager`] for a fixed duration, then checks that the ledger
//! ended consistent and safe.

pub mod backoff;
mod report;
mod requester;

pub use backoff::BackoffPolicy;
pub use report::{RequesterStats, SimulationReport};

use std::sync::Arc;
use std::time::Duration;

use banker_config::SimulationConfig;
use banker_errors::{Error, SimulationError};
use banker_events::{AppEvent, EventEmitter, EventSender, SimulationEvent};
use banker_resources::ResourceManager;
use banker_types::RequesterId;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use requester::RequesterTask;

/// A configured simulation over one resource manager
#[derive(Debug, Clone)]
pub struct Simulation {
    manager: Arc<ResourceManager>,
    config: Arc<SimulationConfig>,
    backoff: BackoffPolicy,
    event_sender: Option<EventSender>,
}

impl Simulation {
    #[must_use]
    pub fn new(
        manager: Arc<ResourceManager>,
        config: SimulationConfig,
        backoff: BackoffPolicy,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            manager,
            config: Arc::new(config),
            backoff,
            event_sender,
        }
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<ResourceManager> {
        &self.manager
    }

    /// Run all requesters for `duration` and collect the outcome.
    ///
    /// A `Tick` event is emitted every `tick_secs`. When `duration` elapses
    /// the requesters are told to stop; each returns whatever it holds
    /// before exiting.
    ///
    /// # Errors
    ///
    /// Returns `InitialStateUnsafe` if the ledger is unsafe before any
    /// requester starts, `RequesterFailed` for the first requester task
    /// that failed or panicked, and an internal error if the ledger lock
    /// is poisoned.
    ///
    /// # Panics
    ///
    /// Panics if the final ledger violates conservation or need
    /// consistency.
    pub async fn run(&self, duration: Duration) -> Result<SimulationReport, Error> {
        if !self.manager.is_safe()? {
            return Err(SimulationError::InitialStateUnsafe.into());
        }

        let requesters = self.manager.requesters();
        let started = Instant::now();
        info!(requesters, ?duration, "simulation starting");
        self.emit(AppEvent::Simulation(SimulationEvent::Started {
            requesters,
            duration,
        }));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles: Vec<_> = (0..requesters)
            .map(|i| {
                let task = RequesterTask::new(
                    RequesterId(i),
                    Arc::clone(&self.manager),
                    Arc::clone(&self.config),
                    self.backoff.clone(),
                    shutdown_rx.clone(),
                    self.event_sender.clone(),
                );
                tokio::spawn(task.run())
            })
            .collect();
        drop(shutdown_rx);

        self.tick_until(started + duration).await;

        debug!("signalling requesters to stop");
        self.emit(AppEvent::Simulation(SimulationEvent::Stopping));
        // Only fails when every requester has already exited.
        let _ = shutdown_tx.send(true);

        // Join every task before reporting, so no requester outlives the run.
        let mut stats = Vec::with_capacity(requesters);
        let mut first_failure = None;
        for (i, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(requester_stats)) => stats.push(requester_stats),
                Ok(Err(err)) => {
                    first_failure.get_or_insert(err);
                }
                Err(join_err) => {
                    first_failure.get_or_insert(SimulationError::RequesterFailed {
                        requester: i,
                        message: format!("task join error: {join_err}"),
                    });
                }
            }
        }
        if let Some(err) = first_failure {
            return Err(err.into());
        }

        self.manager.check_invariants()?;
        let final_snapshot = self.manager.snapshot()?;
        let final_safe = self.manager.is_safe()?;

        let report = SimulationReport {
            requesters: stats,
            final_snapshot,
            final_safe,
            elapsed: started.elapsed(),
        };
        info!(
            grants = report.grants(),
            denials = report.denials(),
            final_safe,
            "simulation completed"
        );
        self.emit(AppEvent::Simulation(SimulationEvent::Completed {
            grants: report.grants(),
            denials: report.denials(),
            final_safe,
        }));

        Ok(report)
    }

    async fn tick_until(&self, deadline: Instant) {
        let tick = self.config.tick().max(Duration::from_millis(1));
        let started = Instant::now();
        let mut ticker = interval_at(started + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let stop = tokio::time::sleep_until(deadline);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                biased;
                () = &mut stop => break,
                _ = ticker.tick() => self.emit_tick(started.elapsed()),
            }
        }
    }
}

impl EventEmitter for Simulation {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}
