#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the banker resource manager
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone for easier handling across tasks.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod ledger;
pub mod request;
pub mod simulation;

// Re-export all error types at the root
pub use config::ConfigError;
pub use ledger::LedgerError;
pub use request::{ReleaseError, RequestError};
pub use simulation::SimulationError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("request error: {0}")]
    Request(#[from] RequestError),

    #[error("release error: {0}")]
    Release(#[from] ReleaseError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias for banker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Ledger(err) => err.user_message(),
            Error::Request(err) => err.user_message(),
            Error::Release(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Simulation(err) => err.user_message(),
            Error::Internal(_) => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Ledger(err) => err.user_hint(),
            Error::Request(err) => err.user_hint(),
            Error::Release(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Simulation(err) => err.user_hint(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Request(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Ledger(err) => err.user_code(),
            Error::Request(err) => err.user_code(),
            Error::Release(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Simulation(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
        }
    }
}
