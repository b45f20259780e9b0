//! Version Reconciliation
//!
//! Pure functions over collected replica responses: dominance reduction to
//! the surviving sibling set, and staleness detection for read repair.
//! Both depend only on the multiset of inputs, never on arrival order.

use crate::cluster::types::NodeId;
use crate::version::types::Version;

/// Reduces a candidate pool to the versions no other candidate strictly
/// dominates.
///
/// Exact duplicates (equal value and equal clock) collapse to one copy.
/// Two candidates with equal clocks but different values are kept as
/// siblings; nothing is ever discarded except by strict dominance.
/// Idempotent: reconciling a reconciled set is a no-op.
pub fn reconcile(candidates: Vec<Version>) -> Vec<Version> {
    let mut survivors: Vec<Version> = Vec::new();

    for candidate in candidates {
        if survivors
            .iter()
            .any(|kept| kept.vector_clock.strictly_dominates(&candidate.vector_clock))
        {
            continue;
        }
        survivors.retain(|kept| !candidate.vector_clock.strictly_dominates(&kept.vector_clock));
        if !survivors.contains(&candidate) {
            survivors.push(candidate);
        }
    }

    survivors
}

/// Picks out the replicas whose response proves them behind the reconciled
/// set.
///
/// A replica is stale when it returned nothing while reconciliation found
/// something, or when some reconciled version strictly dominates every
/// version it returned. A replica holding a mere subset of the current
/// siblings is not stale: nothing it holds is superseded.
pub fn find_stale_replicas(
    responses: &[(NodeId, Vec<Version>)],
    reconciled: &[Version],
) -> Vec<NodeId> {
    if reconciled.is_empty() {
        return Vec::new();
    }

    responses
        .iter()
        .filter(|(_, versions)| {
            if versions.is_empty() {
                return true;
            }
            reconciled.iter().any(|winner| {
                versions
                    .iter()
                    .all(|v| winner.vector_clock.strictly_dominates(&v.vector_clock))
            })
        })
        .map(|(peer, _)| peer.clone())
        .collect()
}
