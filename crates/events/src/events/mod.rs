use serde::{Deserialize, Serialize};

use crate::EventSource;
use banker_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error defines one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod ledger;
pub mod simulation;

pub use ledger::*;
pub use simulation::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Resource ledger events (grants, denials, releases)
    Ledger(LedgerEvent),

    /// Simulation driver events (requester lifecycle, ticks)
    Simulation(SimulationEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::Ledger(_) => EventSource::LEDGER,
            Self::Simulation(_) => EventSource::SIMULATION,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::Simulation(SimulationEvent::RequesterFailed { .. }) => Level::ERROR,

            Self::Simulation(SimulationEvent::Completed { final_safe, .. }) => {
                if *final_safe {
                    Level::INFO
                } else {
                    Level::ERROR
                }
            }

            Self::Ledger(
                LedgerEvent::RequestDenied {
                    kind: DenialKind::ContractViolation,
                    ..
                }
                | LedgerEvent::ReleaseRejected { .. },
            ) => Level::WARN,

            // Insufficient availability is ordinary flow control
            Self::Ledger(LedgerEvent::RequestDenied {
                kind: DenialKind::InsufficientAvailable,
                ..
            })
            | Self::Simulation(
                SimulationEvent::RequesterHolding { .. } | SimulationEvent::Tick { .. },
            ) => Level::DEBUG,

            // Default to INFO for most events
            _ => Level::INFO,
        }
    }
}
