//! Ledger initialization error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors raised while building a ledger from a total vector and a
/// maximum-demand matrix. All of them are fatal for a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum LedgerError {
    #[error("declared demand for resource R{} is {demanded}, but only {total} units exist", .resource + 1)]
    InfeasibleDemand {
        resource: usize,
        demanded: u64,
        total: u32,
    },

    #[error("no requesters declared")]
    NoRequesters,

    #[error("no resource types declared")]
    NoResourceTypes,

    #[error("{what} has {actual} entries, expected {expected}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },
}

impl UserFacingError for LedgerError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InfeasibleDemand { .. } => Some(
                "Lower the maximum demand matrix or raise the resource totals so every declared demand can be met.",
            ),
            Self::NoRequesters => Some("Declare at least one row in the maximum demand matrix."),
            Self::NoResourceTypes => Some("Provide at least one resource total."),
            Self::DimensionMismatch { .. } => {
                Some("Every maximum demand row needs one entry per resource type.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InfeasibleDemand { .. } => "ledger.infeasible_demand",
            Self::NoRequesters => "ledger.no_requesters",
            Self::NoResourceTypes => "ledger.no_resource_types",
            Self::DimensionMismatch { .. } => "ledger.dimension_mismatch",
        };
        Some(code)
    }
}
