//! Request and release error types
//!
//! None of these errors leave a mark on the ledger: every variant is
//! returned before mutation or after an exact rollback.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Reasons a resource request was not granted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RequestError {
    /// The request asks for more than the requester declared it would need.
    #[error("requester {requester} asked for {requested} of R{}, but its remaining need is {need}", .resource + 1)]
    ExceedsNeed {
        requester: usize,
        resource: usize,
        requested: u32,
        need: u32,
    },

    /// Not enough free units right now; retry later.
    #[error("requester {requester} asked for {requested} of R{}, but only {available} are available", .resource + 1)]
    InsufficientAvailable {
        requester: usize,
        resource: usize,
        requested: u32,
        available: u32,
    },

    /// Granting the request would leave the system without a safe sequence.
    #[error("granting the request from requester {requester} would leave the system unsafe")]
    Unsafe { requester: usize },

    #[error("requester {requester} sent an empty request")]
    EmptyRequest { requester: usize },

    #[error("unknown requester {requester} (ledger has {count})")]
    UnknownRequester { requester: usize, count: usize },

    #[error("request vector has {actual} entries, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("resource ledger lock poisoned")]
    LockPoisoned,
}

impl RequestError {
    /// Requester the error refers to, when there is one.
    #[must_use]
    pub fn requester(&self) -> Option<usize> {
        match self {
            Self::ExceedsNeed { requester, .. }
            | Self::InsufficientAvailable { requester, .. }
            | Self::Unsafe { requester }
            | Self::EmptyRequest { requester }
            | Self::UnknownRequester { requester, .. } => Some(*requester),
            Self::DimensionMismatch { .. } | Self::LockPoisoned => None,
        }
    }

    /// Whether this is an ordinary denial rather than a caller mistake.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::InsufficientAvailable { .. } | Self::Unsafe { .. }
        )
    }
}

impl UserFacingError for RequestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InsufficientAvailable { .. } => {
                Some("Wait for other requesters to release resources, then retry.")
            }
            Self::Unsafe { .. } => Some("Retry later or with a smaller request."),
            Self::ExceedsNeed { .. } => {
                Some("Requests must stay within the declared maximum minus current allocation.")
            }
            Self::EmptyRequest { .. } => Some("Drop all-zero requests before submitting them."),
            Self::LockPoisoned => {
                Some("A previous operation panicked while holding the ledger; restart the run.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        self.is_denial()
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ExceedsNeed { .. } => "request.exceeds_need",
            Self::InsufficientAvailable { .. } => "request.insufficient_available",
            Self::Unsafe { .. } => "request.unsafe",
            Self::EmptyRequest { .. } => "request.empty",
            Self::UnknownRequester { .. } => "request.unknown_requester",
            Self::DimensionMismatch { .. } => "request.dimension_mismatch",
            Self::LockPoisoned => "request.lock_poisoned",
        };
        Some(code)
    }
}

/// Reasons a release was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ReleaseError {
    #[error("requester {requester} tried to release {released} of R{}, but holds only {allocated}", .resource + 1)]
    ExceedsAllocation {
        requester: usize,
        resource: usize,
        released: u32,
        allocated: u32,
    },

    #[error("unknown requester {requester} (ledger has {count})")]
    UnknownRequester { requester: usize, count: usize },

    #[error("release vector has {actual} entries, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("resource ledger lock poisoned")]
    LockPoisoned,
}

impl UserFacingError for ReleaseError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ExceedsAllocation { .. } => Some("Only units currently held can be released."),
            Self::LockPoisoned => {
                Some("A previous operation panicked while holding the ledger; restart the run.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ExceedsAllocation { .. } => "release.exceeds_allocation",
            Self::UnknownRequester { .. } => "release.unknown_requester",
            Self::DimensionMismatch { .. } => "release.dimension_mismatch",
            Self::LockPoisoned => "release.lock_poisoned",
        };
        Some(code)
    }
}
