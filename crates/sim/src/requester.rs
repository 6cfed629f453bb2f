//! Requester task
//!
//! Each requester repeatedly draws a random request within its remaining
//! need, holds granted units for a while and then returns them. Denied
//! requests are retried after a backoff delay. The loop ends when the
//! shutdown signal flips; units still held at that point are released
//! before the task returns.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use banker_config::SimulationConfig;
use banker_errors::SimulationError;
use banker_events::{AppEvent, EventEmitter, EventSender, FailureContext, SimulationEvent};
use banker_resources::ResourceManager;
use banker_types::{RequesterId, ResourceVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backoff::BackoffPolicy;
use crate::report::RequesterStats;

pub(crate) struct RequesterTask {
    id: RequesterId,
    manager: Arc<ResourceManager>,
    config: Arc<SimulationConfig>,
    backoff: BackoffPolicy,
    rng: StdRng,
    shutdown: watch::Receiver<bool>,
    event_sender: Option<EventSender>,
    stats: RequesterStats,
}

impl RequesterTask {
    pub(crate) fn new(
        id: RequesterId,
        manager: Arc<ResourceManager>,
        config: Arc<SimulationConfig>,
        backoff: BackoffPolicy,
        shutdown: watch::Receiver<bool>,
        event_sender: Option<EventSender>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id.index() as u64)),
            None => StdRng::from_os_rng(),
        };
        Self {
            id,
            manager,
            config,
            backoff,
            rng,
            shutdown,
            event_sender,
            stats: RequesterStats::new(id),
        }
    }

    pub(crate) async fn run(mut self) -> Result<RequesterStats, SimulationError> {
        self.emit(AppEvent::Simulation(SimulationEvent::RequesterStarted {
            requester: self.id,
        }));

        let result = self.run_loop().await;

        match &result {
            Ok(()) => {
                self.emit(AppEvent::Simulation(SimulationEvent::RequesterExited {
                    requester: self.id,
                    grants: self.stats.grants,
                    denials: self.stats.denials,
                }));
            }
            Err(err) => {
                warn!(requester = %self.id, error = %err, "requester failed");
                self.emit(AppEvent::Simulation(SimulationEvent::RequesterFailed {
                    requester: self.id,
                    failure: FailureContext::from_error(err),
                }));
            }
        }

        result.map(|()| self.stats)
    }

    async fn run_loop(&mut self) -> Result<(), SimulationError> {
        let mut attempt = 0u32;

        while !self.shutting_down() {
            let need = self
                .manager
                .with_ledger(|ledger| ledger.need(self.id).clone())
                .map_err(|e| self.failed(&e))?;

            let request = self.draw_request(&need);
            if request.is_zero() {
                if !self.sleep(self.config.idle()).await {
                    break;
                }
                continue;
            }

            match self.manager.request(self.id, &request) {
                Ok(_) => {
                    self.stats.grants += 1;
                    attempt = 0;
                    self.hold_and_release(&request).await?;
                }
                Err(err) if err.is_denial() => {
                    self.stats.denials += 1;
                    attempt = attempt.saturating_add(1);
                    let delay = self.backoff.delay_with(attempt, &mut self.rng);
                    debug!(requester = %self.id, %request, attempt, ?delay, "request denied");
                    if !self.sleep(delay).await {
                        break;
                    }
                    continue;
                }
                // The draw stays within need, so anything else is a bug here.
                Err(err) => return Err(self.failed(&err)),
            }

            let pause = self.draw_ms(self.config.pause_range_ms());
            if !self.sleep(pause).await {
                break;
            }
        }

        Ok(())
    }

    async fn hold_and_release(&mut self, granted: &ResourceVector) -> Result<(), SimulationError> {
        let hold = self.draw_ms(self.config.hold_range_ms());
        self.emit(AppEvent::Simulation(SimulationEvent::RequesterHolding {
            requester: self.id,
            hold,
        }));

        // Cut short on shutdown; the units go back either way.
        self.sleep(hold).await;

        self.manager
            .release(self.id, granted)
            .map_err(|e| self.failed(&e))
    }

    fn draw_request(&mut self, need: &ResourceVector) -> ResourceVector {
        let cap = self.config.max_request_per_type;
        need.iter()
            .map(|remaining| {
                if remaining == 0 {
                    0
                } else {
                    self.rng.random_range(0..=remaining.min(cap))
                }
            })
            .collect()
    }

    fn draw_ms(&mut self, range: RangeInclusive<u64>) -> Duration {
        let ms = if range.is_empty() {
            *range.start()
        } else {
            self.rng.random_range(range)
        };
        Duration::from_millis(ms)
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep for `duration`; `false` if shutdown was signalled first.
    async fn sleep(&mut self, duration: Duration) -> bool {
        if self.shutting_down() {
            return false;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => true,
            _ = self.shutdown.changed() => false,
        }
    }

    fn failed(&self, error: &impl std::fmt::Display) -> SimulationError {
        SimulationError::RequesterFailed {
            requester: self.id.index(),
            message: error.to_string(),
        }
    }
}

impl EventEmitter for RequesterTask {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}
