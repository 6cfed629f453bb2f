use banker_types::{DemandPolicy, RequestPhase, RequesterId, ResourceVector};
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Why a request was turned down, coarse enough for routing and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// Not enough free units; ordinary flow control
    InsufficientAvailable,
    /// Vetoed by the safety check and rolled back
    Unsafe,
    /// The caller broke the request contract
    ContractViolation,
}

/// Resource ledger events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// Ledger built and checked
    Initialized {
        total: ResourceVector,
        requesters: usize,
        policy: DemandPolicy,
        safe_sequence: Vec<RequesterId>,
    },

    /// Request committed
    RequestGranted {
        requester: RequesterId,
        request: ResourceVector,
        available: ResourceVector,
    },

    /// Request refused without any lasting ledger change
    RequestDenied {
        requester: RequesterId,
        request: ResourceVector,
        kind: DenialKind,
        /// Last phase reached before the refusal
        phase: RequestPhase,
        failure: FailureContext,
    },

    /// Units returned to the pool
    Released {
        requester: RequesterId,
        release: ResourceVector,
        available: ResourceVector,
    },

    /// Release refused
    ReleaseRejected {
        requester: RequesterId,
        release: ResourceVector,
        failure: FailureContext,
    },
}

impl LedgerEvent {
    /// Requester the event is about, if any
    #[must_use]
    pub fn requester(&self) -> Option<RequesterId> {
        match self {
            Self::Initialized { .. } => None,
            Self::RequestGranted { requester, .. }
            | Self::RequestDenied { requester, .. }
            | Self::Released { requester, .. }
            | Self::ReleaseRejected { requester, .. } => Some(*requester),
        }
    }
}
