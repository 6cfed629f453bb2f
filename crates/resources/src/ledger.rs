//! Resource ledger
//!
//! The ledger owns the `available`, `maximum`, `allocation` and `need`
//! matrices of one simulation. Every mutation goes through
//! [`Ledger::apply_tentative`] or [`Ledger::rollback`], both of which take
//! `&mut self`, so exclusive access is enforced by the borrow checker and,
//! across threads, by [`crate::ResourceManager`].

use banker_errors::LedgerError;
use banker_types::{DemandPolicy, Direction, LedgerSnapshot, RequesterId, ResourceVector};

use crate::safety;

/// Available, maximum, allocation and need for a fixed set of requesters
/// and resource types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    total: ResourceVector,
    available: ResourceVector,
    maximum: Vec<ResourceVector>,
    allocation: Vec<ResourceVector>,
    need: Vec<ResourceVector>,
    policy: DemandPolicy,
}

impl Ledger {
    /// Build a ledger under [`DemandPolicy::Strict`].
    ///
    /// # Errors
    ///
    /// See [`Ledger::initialize_with_policy`].
    pub fn initialize(
        total: ResourceVector,
        maximum: Vec<ResourceVector>,
    ) -> Result<Self, LedgerError> {
        Self::initialize_with_policy(total, maximum, DemandPolicy::Strict)
    }

    /// Build a ledger with every requester holding nothing.
    ///
    /// # Errors
    ///
    /// Returns `NoResourceTypes` / `NoRequesters` for empty inputs,
    /// `DimensionMismatch` when a maximum row has the wrong length, and
    /// `InfeasibleDemand` when the declared demand cannot be met under
    /// `policy`.
    pub fn initialize_with_policy(
        total: ResourceVector,
        maximum: Vec<ResourceVector>,
        policy: DemandPolicy,
    ) -> Result<Self, LedgerError> {
        if total.is_empty() {
            return Err(LedgerError::NoResourceTypes);
        }
        if maximum.is_empty() {
            return Err(LedgerError::NoRequesters);
        }

        let resource_types = total.len();
        for (i, row) in maximum.iter().enumerate() {
            if row.len() != resource_types {
                return Err(LedgerError::DimensionMismatch {
                    what: format!("maximum demand of requester {i}"),
                    expected: resource_types,
                    actual: row.len(),
                });
            }
        }

        check_demand(&total, &maximum, policy)?;

        let requesters = maximum.len();
        Ok(Self {
            available: total.clone(),
            allocation: vec![ResourceVector::zeros(resource_types); requesters],
            need: maximum.clone(),
            total,
            maximum,
            policy,
        })
    }

    /// Number of requesters (C)
    #[must_use]
    pub fn requesters(&self) -> usize {
        self.maximum.len()
    }

    /// Number of resource types (R)
    #[must_use]
    pub fn resource_types(&self) -> usize {
        self.total.len()
    }

    #[must_use]
    pub fn policy(&self) -> DemandPolicy {
        self.policy
    }

    #[must_use]
    pub fn total(&self) -> &ResourceVector {
        &self.total
    }

    #[must_use]
    pub fn available(&self) -> &ResourceVector {
        &self.available
    }

    /// Declared maximum of a requester.
    ///
    /// # Panics
    ///
    /// Panics if `requester` is out of range.
    #[must_use]
    pub fn maximum(&self, requester: RequesterId) -> &ResourceVector {
        &self.maximum[requester.index()]
    }

    /// Current allocation of a requester.
    ///
    /// # Panics
    ///
    /// Panics if `requester` is out of range.
    #[must_use]
    pub fn allocation(&self, requester: RequesterId) -> &ResourceVector {
        &self.allocation[requester.index()]
    }

    /// Remaining need of a requester.
    ///
    /// # Panics
    ///
    /// Panics if `requester` is out of range.
    #[must_use]
    pub fn need(&self, requester: RequesterId) -> &ResourceVector {
        &self.need[requester.index()]
    }

    /// Owned copy of all matrices, consistent because it is taken under the
    /// same borrow.
    #[must_use]
    pub fn snapshot_for_safety(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total: self.total.clone(),
            available: self.available.clone(),
            maximum: self.maximum.clone(),
            allocation: self.allocation.clone(),
            need: self.need.clone(),
        }
    }

    /// Run the safety check against the current state without copying it.
    #[must_use]
    pub fn safe_sequence(&self) -> Option<Vec<RequesterId>> {
        safety::safe_sequence(&self.available, &self.allocation, &self.need)
    }

    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.safe_sequence().is_some()
    }

    /// Move `delta` between `available` and `requester`.
    ///
    /// The caller has already validated `delta` against `need` and
    /// `available` (acquire) or `allocation` (release).
    ///
    /// # Panics
    ///
    /// Panics if `requester` is out of range. In debug builds, also panics
    /// when `delta` has not been validated and a quantity would underflow.
    pub fn apply_tentative(
        &mut self,
        requester: RequesterId,
        delta: &ResourceVector,
        direction: Direction,
    ) {
        let i = requester.index();
        match direction {
            Direction::Acquire => {
                self.available -= delta;
                self.allocation[i] += delta;
                self.need[i] -= delta;
            }
            Direction::Release => {
                self.available += delta;
                self.allocation[i] -= delta;
                self.need[i] = self.derive_need(i);
            }
        }
    }

    /// Undo an [`Direction::Acquire`] of `delta` by `requester`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Ledger::apply_tentative`].
    pub fn rollback(&mut self, requester: RequesterId, delta: &ResourceVector) {
        let i = requester.index();
        self.available += delta;
        self.allocation[i] -= delta;
        self.need[i] += delta;
    }

    /// Verify need consistency and conservation.
    ///
    /// # Panics
    ///
    /// Panics with a diagnostic on any violation: a broken invariant means a
    /// ledger mutation bug, never a caller error.
    pub fn check_invariants(&self) {
        for i in 0..self.requesters() {
            let derived = self.derive_need(i);
            assert!(
                self.need[i] == derived,
                "need of requester {i} is {}, but maximum {} minus allocation {} is {derived}",
                self.need[i],
                self.maximum[i],
                self.allocation[i],
            );
        }

        for j in 0..self.resource_types() {
            let held: u64 = self.allocation.iter().map(|row| u64::from(row[j])).sum();
            let accounted = u64::from(self.available[j]) + held;
            assert!(
                accounted == u64::from(self.total[j]),
                "resource R{} not conserved: available {} + allocated {held} != total {}",
                j + 1,
                self.available[j],
                self.total[j],
            );
        }
    }

    fn derive_need(&self, i: usize) -> ResourceVector {
        self.maximum[i]
            .iter()
            .zip(self.allocation[i].iter())
            .map(|(max, held)| max - held)
            .collect()
    }
}

fn check_demand(
    total: &ResourceVector,
    maximum: &[ResourceVector],
    policy: DemandPolicy,
) -> Result<(), LedgerError> {
    for (j, cap) in total.iter().enumerate() {
        let demanded = match policy {
            DemandPolicy::Strict => maximum.iter().map(|row| u64::from(row[j])).sum(),
            DemandPolicy::PerRequester => maximum
                .iter()
                .map(|row| u64::from(row[j]))
                .max()
                .unwrap_or(0),
        };
        if demanded > u64::from(cap) {
            return Err(LedgerError::InfeasibleDemand {
                resource: j,
                demanded,
                total: cap,
            });
        }
    }
    Ok(())
}
