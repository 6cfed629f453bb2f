//! Simulation outcome

use banker_types::{LedgerSnapshot, RequesterId};
use serde::Serialize;
use std::time::Duration;

/// Counters collected by one requester task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequesterStats {
    pub requester: RequesterId,
    pub grants: u64,
    /// Requests refused for lack of units or safety
    pub denials: u64,
}

impl RequesterStats {
    #[must_use]
    pub fn new(requester: RequesterId) -> Self {
        Self {
            requester,
            grants: 0,
            denials: 0,
        }
    }
}

/// Result of [`crate::Simulation::run`]
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Ordered by requester id
    pub requesters: Vec<RequesterStats>,
    pub final_snapshot: LedgerSnapshot,
    pub final_safe: bool,
    pub elapsed: Duration,
}

impl SimulationReport {
    #[must_use]
    pub fn grants(&self) -> u64 {
        self.requesters.iter().map(|stats| stats.grants).sum()
    }

    #[must_use]
    pub fn denials(&self) -> u64 {
        self.requesters.iter().map(|stats| stats.denials).sum()
    }
}
