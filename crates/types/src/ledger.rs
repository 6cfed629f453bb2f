//! Ledger-level types shared between the resource manager, the simulation
//! driver and the CLI.

use crate::ResourceVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a requester in `[0, C)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub usize);

impl RequesterId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for RequesterId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// How declared maximum demand is checked against the resource totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandPolicy {
    /// Column sums of the maximum matrix must fit within the totals, so
    /// every requester can hold its full maximum at once.
    Strict,
    /// Each requester's maximum must individually fit within the totals.
    PerRequester,
}

impl Default for DemandPolicy {
    fn default() -> Self {
        Self::Strict
    }
}

impl fmt::Display for DemandPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::PerRequester => write!(f, "per_requester"),
        }
    }
}

impl clap::ValueEnum for DemandPolicy {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Strict, Self::PerRequester]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Strict => clap::builder::PossibleValue::new("strict"),
            Self::PerRequester => clap::builder::PossibleValue::new("per-requester")
                .alias("per_requester"),
        })
    }
}

/// Direction of a ledger mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Units move from `available` to the requester
    Acquire,
    /// Units move from the requester back to `available`
    Release,
}

/// Phases a request moves through inside the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Validating,
    Tentative,
    Committed,
    RolledBack,
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Tentative => "tentative",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// Owned copy of the ledger at one consistent point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub total: ResourceVector,
    pub available: ResourceVector,
    pub maximum: Vec<ResourceVector>,
    pub allocation: Vec<ResourceVector>,
    pub need: Vec<ResourceVector>,
}

impl LedgerSnapshot {
    /// Number of requesters
    #[must_use]
    pub fn requesters(&self) -> usize {
        self.maximum.len()
    }

    /// Number of resource types
    #[must_use]
    pub fn resource_types(&self) -> usize {
        self.total.len()
    }

    /// Units of `resource` currently held by all requesters together
    #[must_use]
    pub fn allocated_units(&self, resource: usize) -> u64 {
        self.allocation
            .iter()
            .map(|row| u64::from(row[resource]))
            .sum()
    }
}
