use banker_types::RequesterId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;

/// Simulation driver events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimulationEvent {
    /// Requester tasks are being spawned
    Started {
        requesters: usize,
        duration: Duration,
    },

    RequesterStarted { requester: RequesterId },

    /// Requester is holding granted units
    RequesterHolding {
        requester: RequesterId,
        hold: Duration,
    },

    /// Requester task returned
    RequesterExited {
        requester: RequesterId,
        grants: u64,
        denials: u64,
    },

    /// Requester task ended with an error
    RequesterFailed {
        requester: RequesterId,
        failure: FailureContext,
    },

    /// Once per tick while the simulation runs
    Tick { elapsed: Duration },

    /// Shutdown signalled, waiting for requesters
    Stopping,

    /// All requesters joined
    Completed {
        grants: u64,
        denials: u64,
        final_safe: bool,
    },
}
