//! Simulation driver error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SimulationError {
    #[error("initial state is unsafe")]
    InitialStateUnsafe,

    #[error("requester {requester} task failed: {message}")]
    RequesterFailed { requester: usize, message: String },

    #[error("simulation ended in an unsafe state")]
    FinalStateUnsafe,
}

impl UserFacingError for SimulationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InitialStateUnsafe => Some("Check the maximum demand matrix against the totals."),
            Self::RequesterFailed { .. } | Self::FinalStateUnsafe => {
                Some("This indicates a bug; rerun with --debug and report the log.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InitialStateUnsafe => "simulation.initial_unsafe",
            Self::RequesterFailed { .. } => "simulation.requester_failed",
            Self::FinalStateUnsafe => "simulation.final_unsafe",
        };
        Some(code)
    }
}
