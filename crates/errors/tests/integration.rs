//! Integration tests for error types

#[cfg(test)]
mod tests {
    use banker_errors::*;

    #[test]
    fn test_error_conversion() {
        let err: Error = RequestError::Unsafe { requester: 2 }.into();
        assert!(matches!(err, Error::Request(RequestError::Unsafe { .. })));

        let err: Error = LedgerError::NoRequesters.into();
        assert!(matches!(err, Error::Ledger(_)));
    }

    #[test]
    fn test_error_display_uses_one_based_resource_names() {
        let err = RequestError::ExceedsNeed {
            requester: 0,
            resource: 1,
            requested: 3,
            need: 2,
        };
        assert_eq!(
            err.to_string(),
            "requester 0 asked for 3 of R2, but its remaining need is 2"
        );

        let err = LedgerError::InfeasibleDemand {
            resource: 0,
            demanded: 11,
            total: 10,
        };
        assert_eq!(
            err.to_string(),
            "declared demand for resource R1 is 11, but only 10 units exist"
        );
    }

    #[test]
    fn test_only_denials_are_retryable() {
        let insufficient = RequestError::InsufficientAvailable {
            requester: 1,
            resource: 0,
            requested: 2,
            available: 1,
        };
        assert!(insufficient.is_retryable());
        assert!(RequestError::Unsafe { requester: 1 }.is_retryable());

        let exceeds = RequestError::ExceedsNeed {
            requester: 1,
            resource: 0,
            requested: 2,
            need: 1,
        };
        assert!(!exceeds.is_retryable());
        assert!(!exceeds.is_denial());

        let release = ReleaseError::ExceedsAllocation {
            requester: 1,
            resource: 0,
            released: 2,
            allocated: 1,
        };
        assert!(!release.is_retryable());
    }

    #[test]
    fn test_user_codes_are_forwarded() {
        let err: Error = ReleaseError::LockPoisoned.into();
        assert_eq!(err.user_code(), Some("release.lock_poisoned"));
        assert!(err.user_hint().is_some());

        let err: Error = RequestError::Unsafe { requester: 0 }.into();
        assert_eq!(err.user_code(), Some("request.unsafe"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_requester_accessor() {
        assert_eq!(RequestError::EmptyRequest { requester: 4 }.requester(), Some(4));
        assert_eq!(RequestError::LockPoisoned.requester(), None);
    }
}
