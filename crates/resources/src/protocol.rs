//! Request/release protocol
//!
//! A request moves through `Validating → Tentative → Committed` or
//! `Validating → Tentative → RolledBack`. Validation failures return before
//! the ledger is touched; a safety veto rolls the tentative grant back
//! exactly, so a refused request never leaves a trace.

use banker_errors::{ReleaseError, RequestError};
use banker_types::{Direction, RequestPhase, RequesterId, ResourceVector};
use serde::Serialize;
use tracing::{debug, trace};

use crate::Ledger;

/// A committed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub requester: RequesterId,
    pub granted: ResourceVector,
    /// `available` right after the grant
    pub available: ResourceVector,
    /// Finish order that proved the post-grant state safe
    pub safe_sequence: Vec<RequesterId>,
}

/// Last phase a refused request reached.
#[must_use]
pub fn denial_phase(error: &RequestError) -> RequestPhase {
    match error {
        RequestError::Unsafe { .. } => RequestPhase::RolledBack,
        _ => RequestPhase::Validating,
    }
}

impl Ledger {
    /// Grant `request` to `requester` if the result is safe.
    ///
    /// # Errors
    ///
    /// - `UnknownRequester` / `DimensionMismatch` / `EmptyRequest` for
    ///   malformed calls
    /// - `ExceedsNeed` when the request is above the remaining need
    /// - `InsufficientAvailable` when free units do not cover it
    /// - `Unsafe` when granting would leave no safe sequence; the tentative
    ///   grant has been rolled back
    ///
    /// The ledger is unchanged whenever an error is returned.
    pub fn request(
        &mut self,
        requester: RequesterId,
        request: &ResourceVector,
    ) -> Result<Grant, RequestError> {
        trace!(%requester, %request, phase = %RequestPhase::Validating, "request");
        self.validate_request(requester, request)?;

        self.apply_tentative(requester, request, Direction::Acquire);
        trace!(%requester, %request, phase = %RequestPhase::Tentative, "request");

        if let Some(safe_sequence) = self.safe_sequence() {
            #[cfg(debug_assertions)]
            self.check_invariants();

            debug!(%requester, %request, available = %self.available(), phase = %RequestPhase::Committed, "request granted");
            return Ok(Grant {
                requester,
                granted: request.clone(),
                available: self.available().clone(),
                safe_sequence,
            });
        }

        self.rollback(requester, request);
        #[cfg(debug_assertions)]
        self.check_invariants();

        debug!(%requester, %request, phase = %RequestPhase::RolledBack, "request would be unsafe");
        Err(RequestError::Unsafe {
            requester: requester.index(),
        })
    }

    /// Return `release` units held by `requester` to the pool.
    ///
    /// Releasing never makes a safe state unsafe, so no safety check runs.
    ///
    /// # Errors
    ///
    /// `ExceedsAllocation` when the requester holds fewer units than it
    /// releases; `UnknownRequester` / `DimensionMismatch` for malformed
    /// calls. The ledger is unchanged whenever an error is returned.
    pub fn release(
        &mut self,
        requester: RequesterId,
        release: &ResourceVector,
    ) -> Result<(), ReleaseError> {
        let count = self.requesters();
        if requester.index() >= count {
            return Err(ReleaseError::UnknownRequester {
                requester: requester.index(),
                count,
            });
        }
        if release.len() != self.resource_types() {
            return Err(ReleaseError::DimensionMismatch {
                expected: self.resource_types(),
                actual: release.len(),
            });
        }
        if let Some((resource, released, allocated)) =
            release.first_excess(self.allocation(requester))
        {
            return Err(ReleaseError::ExceedsAllocation {
                requester: requester.index(),
                resource,
                released,
                allocated,
            });
        }

        self.apply_tentative(requester, release, Direction::Release);
        #[cfg(debug_assertions)]
        self.check_invariants();

        debug!(%requester, %release, available = %self.available(), "released");
        Ok(())
    }

    fn validate_request(
        &self,
        requester: RequesterId,
        request: &ResourceVector,
    ) -> Result<(), RequestError> {
        let count = self.requesters();
        if requester.index() >= count {
            return Err(RequestError::UnknownRequester {
                requester: requester.index(),
                count,
            });
        }
        if request.len() != self.resource_types() {
            return Err(RequestError::DimensionMismatch {
                expected: self.resource_types(),
                actual: request.len(),
            });
        }
        if request.is_zero() {
            return Err(RequestError::EmptyRequest {
                requester: requester.index(),
            });
        }
        if let Some((resource, requested, need)) = request.first_excess(self.need(requester)) {
            return Err(RequestError::ExceedsNeed {
                requester: requester.index(),
                resource,
                requested,
                need,
            });
        }
        if let Some((resource, requested, available)) = request.first_excess(self.available()) {
            return Err(RequestError::InsufficientAvailable {
                requester: requester.index(),
                resource,
                requested,
                available,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banker_types::DemandPolicy;

    fn ledger(total: &[u32], maximum: &[&[u32]], policy: DemandPolicy) -> Ledger {
        Ledger::initialize_with_policy(
            total.iter().copied().collect(),
            maximum
                .iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
            policy,
        )
        .unwrap()
    }

    #[test]
    fn test_request_grant_updates_all_matrices() {
        let mut ledger = ledger(&[10, 5, 7], &[&[7, 5, 3], &[3, 2, 2]], DemandPolicy::PerRequester);

        let grant = ledger
            .request(RequesterId(0), &ResourceVector::from([2, 0, 1]))
            .unwrap();

        assert_eq!(grant.available, ResourceVector::from([8, 5, 6]));
        assert_eq!(ledger.allocation(RequesterId(0)), &ResourceVector::from([2, 0, 1]));
        assert_eq!(ledger.need(RequesterId(0)), &ResourceVector::from([5, 5, 2]));
    }

    #[test]
    fn test_validation_order() {
        let mut ledger = ledger(&[4, 4], &[&[2, 2], &[2, 2]], DemandPolicy::Strict);

        // Exceeding need wins over exceeding availability.
        let err = ledger
            .request(RequesterId(0), &ResourceVector::from([3, 0]))
            .unwrap_err();
        assert!(matches!(err, RequestError::ExceedsNeed { resource: 0, .. }));

        let err = ledger
            .request(RequesterId(2), &ResourceVector::from([1, 0]))
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::UnknownRequester {
                requester: 2,
                count: 2
            }
        );

        let err = ledger
            .request(RequesterId(0), &ResourceVector::from([1]))
            .unwrap_err();
        assert!(matches!(err, RequestError::DimensionMismatch { .. }));

        let err = ledger
            .request(RequesterId(0), &ResourceVector::zeros(2))
            .unwrap_err();
        assert!(matches!(err, RequestError::EmptyRequest { requester: 0 }));
    }

    #[test]
    fn test_insufficient_available_leaves_ledger_untouched() {
        let mut ledger = ledger(&[3], &[&[3], &[3]], DemandPolicy::PerRequester);
        ledger.request(RequesterId(0), &ResourceVector::from([3])).unwrap();
        let before = ledger.clone();

        let err = ledger
            .request(RequesterId(1), &ResourceVector::from([1]))
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::InsufficientAvailable {
                requester: 1,
                available: 0,
                ..
            }
        ));
        assert_eq!(ledger, before);
        assert_eq!(denial_phase(&err), RequestPhase::Validating);
    }

    #[test]
    fn test_release_validation() {
        let mut ledger = ledger(&[3, 3], &[&[2, 2]], DemandPolicy::Strict);
        ledger.request(RequesterId(0), &ResourceVector::from([1, 2])).unwrap();
        let before = ledger.clone();

        let err = ledger
            .release(RequesterId(0), &ResourceVector::from([2, 0]))
            .unwrap_err();
        assert_eq!(
            err,
            ReleaseError::ExceedsAllocation {
                requester: 0,
                resource: 0,
                released: 2,
                allocated: 1,
            }
        );
        assert_eq!(ledger, before);

        // Empty release is a no-op, not an error.
        ledger.release(RequesterId(0), &ResourceVector::zeros(2)).unwrap();
        assert_eq!(ledger, before);
    }
}
