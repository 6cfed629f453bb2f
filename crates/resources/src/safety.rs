//! Banker's safety check
//!
//! Pure functions over a ledger snapshot. The scan always restarts from the
//! lowest requester id after a requester finishes, so the finish order is
//! deterministic and favors low ids when several requesters could finish.

use banker_types::{LedgerSnapshot, RequesterId, ResourceVector};

/// Finish order of the safety scan, or `None` when the state is unsafe.
///
/// `allocation` and `need` are indexed by requester and must have the same
/// length; every vector must have the length of `available`.
#[must_use]
pub fn safe_sequence(
    available: &ResourceVector,
    allocation: &[ResourceVector],
    need: &[ResourceVector],
) -> Option<Vec<RequesterId>> {
    debug_assert_eq!(allocation.len(), need.len());

    let requesters = need.len();
    let mut work = available.clone();
    let mut finish = vec![false; requesters];
    let mut order = Vec::with_capacity(requesters);

    while order.len() < requesters {
        let next = (0..requesters).find(|&i| !finish[i] && need[i].fits_within(&work))?;

        work += &allocation[next];
        finish[next] = true;
        order.push(RequesterId(next));
    }

    Some(order)
}

/// Whether some finishing order lets every requester complete.
#[must_use]
pub fn is_safe(
    available: &ResourceVector,
    allocation: &[ResourceVector],
    need: &[ResourceVector],
) -> bool {
    safe_sequence(available, allocation, need).is_some()
}

/// [`safe_sequence`] over a snapshot.
#[must_use]
pub fn snapshot_safe_sequence(snapshot: &LedgerSnapshot) -> Option<Vec<RequesterId>> {
    safe_sequence(&snapshot.available, &snapshot.allocation, &snapshot.need)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(rows: &[&[u32]]) -> Vec<ResourceVector> {
        rows.iter().map(|row| row.iter().copied().collect()).collect()
    }

    #[test]
    fn test_textbook_state_is_safe() {
        // Silberschatz example: 5 processes, 3 resource types
        let available = ResourceVector::from([3, 3, 2]);
        let allocation = vectors(&[&[0, 1, 0], &[2, 0, 0], &[3, 0, 2], &[2, 1, 1], &[0, 0, 2]]);
        let need = vectors(&[&[7, 4, 3], &[1, 2, 2], &[6, 0, 0], &[0, 1, 1], &[4, 3, 1]]);

        let order = safe_sequence(&available, &allocation, &need).unwrap();
        // Rescan from the top after each finish: P1, then P3, then P0 becomes
        // satisfiable before P4.
        assert_eq!(
            order,
            vec![
                RequesterId(1),
                RequesterId(3),
                RequesterId(0),
                RequesterId(2),
                RequesterId(4)
            ]
        );
    }

    #[test]
    fn test_lowest_id_wins_ties() {
        let available = ResourceVector::from([5]);
        let allocation = vectors(&[&[1], &[1], &[1]]);
        let need = vectors(&[&[1], &[1], &[1]]);

        let order = safe_sequence(&available, &allocation, &need).unwrap();
        assert_eq!(order, vec![RequesterId(0), RequesterId(1), RequesterId(2)]);
    }

    #[test]
    fn test_unsafe_when_nobody_can_finish() {
        let available = ResourceVector::from([0]);
        let allocation = vectors(&[&[1], &[1]]);
        let need = vectors(&[&[1], &[1]]);

        assert!(!is_safe(&available, &allocation, &need));
    }

    #[test]
    fn test_partial_progress_still_unsafe() {
        // Requester 0 can finish, but what it returns does not cover 1 or 2.
        let available = ResourceVector::from([1, 0]);
        let allocation = vectors(&[&[0, 0], &[1, 0], &[0, 1]]);
        let need = vectors(&[&[1, 0], &[0, 2], &[0, 2]]);

        assert!(safe_sequence(&available, &allocation, &need).is_none());
    }

    #[test]
    fn test_no_requesters_is_trivially_safe() {
        assert_eq!(
            safe_sequence(&ResourceVector::from([1]), &[], &[]),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let available = ResourceVector::from([2, 1]);
        let allocation = vectors(&[&[1, 0], &[0, 1], &[1, 1]]);
        let need = vectors(&[&[2, 1], &[1, 1], &[3, 2]]);

        let first = safe_sequence(&available, &allocation, &need);
        for _ in 0..16 {
            assert_eq!(safe_sequence(&available, &allocation, &need), first);
        }
    }
}
