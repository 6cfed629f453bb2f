//! Concurrent access to the ledger
//!
//! [`ResourceManager`] is the single mutual-exclusion domain around a
//! [`Ledger`]. Each request or release holds the lock for its whole
//! validate → apply → check → commit/rollback sequence, so no caller can
//! observe or reason about another caller's tentative state.

use std::sync::{Mutex, MutexGuard};

use banker_errors::{Error, ReleaseError, RequestError};
use banker_events::{
    AppEvent, DenialKind, EventEmitter, EventSender, FailureContext, LedgerEvent,
};
use banker_types::{LedgerSnapshot, RequesterId, ResourceVector};

use crate::protocol::denial_phase;
use crate::{Grant, Ledger};

/// Shared, lock-guarded ledger.
///
/// Share it between requester tasks with `Arc<ResourceManager>`.
#[derive(Debug)]
pub struct ResourceManager {
    ledger: Mutex<Ledger>,
    requesters: usize,
    resource_types: usize,
    event_sender: Option<EventSender>,
}

impl ResourceManager {
    /// Wrap an initialized ledger
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            requesters: ledger.requesters(),
            resource_types: ledger.resource_types(),
            ledger: Mutex::new(ledger),
            event_sender: None,
        }
    }

    /// Report grants, denials and releases on `sender`
    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Number of requesters (fixed at initialization)
    #[must_use]
    pub fn requesters(&self) -> usize {
        self.requesters
    }

    /// Number of resource types (fixed at initialization)
    #[must_use]
    pub fn resource_types(&self) -> usize {
        self.resource_types
    }

    /// Request resources for `requester`.
    ///
    /// Never blocks beyond acquiring the ledger lock; a denied caller
    /// decides itself whether and when to retry.
    ///
    /// # Errors
    ///
    /// See [`Ledger::request`]; additionally `LockPoisoned` if another
    /// caller panicked while holding the ledger.
    pub fn request(
        &self,
        requester: RequesterId,
        request: &ResourceVector,
    ) -> Result<Grant, RequestError> {
        // Events are sent under the lock so their order is commit order.
        let mut ledger = self.ledger.lock().map_err(|_| RequestError::LockPoisoned)?;
        let result = ledger.request(requester, request);

        match &result {
            Ok(grant) => {
                self.emit_request_granted(requester, request.clone(), grant.available.clone());
            }
            Err(err) => {
                let kind = if matches!(err, RequestError::Unsafe { .. }) {
                    DenialKind::Unsafe
                } else if err.is_denial() {
                    DenialKind::InsufficientAvailable
                } else {
                    DenialKind::ContractViolation
                };
                self.emit(AppEvent::Ledger(LedgerEvent::RequestDenied {
                    requester,
                    request: request.clone(),
                    kind,
                    phase: denial_phase(err),
                    failure: FailureContext::from_error(err),
                }));
            }
        }
        drop(ledger);

        result
    }

    /// Release resources held by `requester`.
    ///
    /// # Errors
    ///
    /// See [`Ledger::release`]; additionally `LockPoisoned`.
    pub fn release(
        &self,
        requester: RequesterId,
        release: &ResourceVector,
    ) -> Result<(), ReleaseError> {
        let mut ledger = self.ledger.lock().map_err(|_| ReleaseError::LockPoisoned)?;
        match ledger.release(requester, release) {
            Ok(()) => {
                // A zero release changes nothing and is not reported.
                if !release.is_zero() {
                    self.emit_released(requester, release.clone(), ledger.available().clone());
                }
                Ok(())
            }
            Err(err) => {
                self.emit(AppEvent::Ledger(LedgerEvent::ReleaseRejected {
                    requester,
                    release: release.clone(),
                    failure: FailureContext::from_error(&err),
                }));
                Err(err)
            }
        }
    }

    /// Consistent copy of the whole ledger
    ///
    /// # Errors
    ///
    /// Returns an internal error if the ledger lock is poisoned.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, Error> {
        Ok(self.lock()?.snapshot_for_safety())
    }

    /// Safe sequence of the current state, `None` if unsafe
    ///
    /// # Errors
    ///
    /// Returns an internal error if the ledger lock is poisoned.
    pub fn safe_sequence(&self) -> Result<Option<Vec<RequesterId>>, Error> {
        Ok(self.lock()?.safe_sequence())
    }

    /// # Errors
    ///
    /// Returns an internal error if the ledger lock is poisoned.
    pub fn is_safe(&self) -> Result<bool, Error> {
        Ok(self.lock()?.is_safe())
    }

    /// Verify conservation and need consistency under the lock.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the ledger lock is poisoned.
    ///
    /// # Panics
    ///
    /// Panics if an invariant is violated, see [`Ledger::check_invariants`].
    pub fn check_invariants(&self) -> Result<(), Error> {
        self.lock()?.check_invariants();
        Ok(())
    }

    /// Run `f` with exclusive access to the ledger.
    ///
    /// Lets callers combine several reads (or a read and a decision) into
    /// one atomic step.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the ledger lock is poisoned.
    pub fn with_ledger<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T, Error> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, Error> {
        self.ledger
            .lock()
            .map_err(|_| Error::internal("resource ledger lock poisoned"))
    }
}

impl EventEmitter for ResourceManager {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banker_types::DemandPolicy;
    use std::sync::Arc;

    fn manager() -> ResourceManager {
        let ledger = Ledger::initialize_with_policy(
            ResourceVector::from([2]),
            vec![ResourceVector::from([2]), ResourceVector::from([2])],
            DemandPolicy::PerRequester,
        )
        .unwrap();
        ResourceManager::new(ledger)
    }

    #[tokio::test]
    async fn test_events_follow_outcomes() {
        let (tx, mut rx) = banker_events::channel();
        let manager = manager().with_event_sender(tx);

        manager
            .request(RequesterId(0), &ResourceVector::from([1]))
            .unwrap();
        let err = manager
            .request(RequesterId(1), &ResourceVector::from([1]))
            .unwrap_err();
        assert!(matches!(err, RequestError::Unsafe { requester: 1 }));
        manager
            .release(RequesterId(0), &ResourceVector::from([1]))
            .unwrap();

        let granted = rx.recv().await.unwrap();
        assert!(matches!(
            granted.event,
            AppEvent::Ledger(LedgerEvent::RequestGranted { .. })
        ));

        let denied = rx.recv().await.unwrap();
        match denied.event {
            AppEvent::Ledger(LedgerEvent::RequestDenied {
                kind,
                phase,
                failure,
                ..
            }) => {
                assert_eq!(kind, DenialKind::Unsafe);
                assert_eq!(phase, banker_types::RequestPhase::RolledBack);
                assert_eq!(failure.code.as_deref(), Some("request.unsafe"));
            }
            other => panic!("unexpected event {other:?}"),
        }

        let released = rx.recv().await.unwrap();
        assert!(matches!(
            released.event,
            AppEvent::Ledger(LedgerEvent::Released { .. })
        ));
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let manager = Arc::new(manager());

        let poisoner = Arc::clone(&manager);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.ledger.lock().unwrap();
            panic!("poison the ledger");
        })
        .join();

        assert_eq!(
            manager
                .request(RequesterId(0), &ResourceVector::from([1]))
                .unwrap_err(),
            RequestError::LockPoisoned
        );
        assert_eq!(
            manager
                .release(RequesterId(0), &ResourceVector::from([0]))
                .unwrap_err(),
            ReleaseError::LockPoisoned
        );
        assert!(manager.snapshot().is_err());
        assert!(manager.with_ledger(Ledger::is_safe).is_err());
    }

    #[tokio::test]
    async fn test_zero_release_is_silent() {
        let (tx, mut rx) = banker_events::channel();
        let manager = manager().with_event_sender(tx);

        manager
            .release(RequesterId(0), &ResourceVector::from([0]))
            .unwrap();
        manager
            .request(RequesterId(0), &ResourceVector::from([1]))
            .unwrap();

        // The first event on the channel is the grant, not a release.
        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            AppEvent::Ledger(LedgerEvent::RequestGranted { .. })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_with_ledger_reads_under_lock() {
        let manager = manager();
        manager
            .request(RequesterId(1), &ResourceVector::from([1]))
            .unwrap();

        let need = manager
            .with_ledger(|ledger| ledger.need(RequesterId(1)).clone())
            .unwrap();
        assert_eq!(need, ResourceVector::from([1]));
    }

    #[test]
    fn test_event_stream_replays_in_commit_order() {
        let (tx, mut rx) = banker_events::channel();
        let total = ResourceVector::from([6, 4]);
        let ledger = Ledger::initialize_with_policy(
            total.clone(),
            vec![ResourceVector::from([3, 2]); 4],
            DemandPolicy::PerRequester,
        )
        .unwrap();
        let manager = Arc::new(ResourceManager::new(ledger).with_event_sender(tx));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    let unit = ResourceVector::from([1, 1]);
                    for _ in 0..500 {
                        if manager.request(RequesterId(i), &unit).is_ok() {
                            manager.release(RequesterId(i), &unit).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        drop(manager);

        // Replaying grants and releases in arrival order must reproduce
        // every reported `available` vector.
        let mut available = total.clone();
        while let Ok(message) = rx.try_recv() {
            match message.event {
                AppEvent::Ledger(LedgerEvent::RequestGranted {
                    request,
                    available: reported,
                    ..
                }) => {
                    available -= &request;
                    assert_eq!(available, reported);
                }
                AppEvent::Ledger(LedgerEvent::Released {
                    release,
                    available: reported,
                    ..
                }) => {
                    available += &release;
                    assert_eq!(available, reported);
                }
                _ => {}
            }
        }
        assert_eq!(available, total);
    }

    #[test]
    fn test_dimensions_are_cached() {
        let manager = manager();
        assert_eq!(manager.requesters(), 2);
        assert_eq!(manager.resource_types(), 1);
        assert!(manager.is_safe().unwrap());
        manager.check_invariants().unwrap();
    }
}
