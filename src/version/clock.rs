use crate::cluster::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of comparing two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOrdering {
    /// Same causal history (counter-for-counter equal).
    Equal,
    /// The left clock happened-after the right one.
    Dominates,
    /// The left clock happened-before the right one.
    Dominated,
    /// Neither clock dominates; the versions are siblings.
    Concurrent,
}

/// Per-node update counters capturing the causal history of a version.
///
/// A node absent from the map holds counter 0 by definition, so comparison
/// and merge operate over the union of both key sets. The backing map is a
/// `BTreeMap` so the JSON encoding is byte-identical on every node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VectorClock(pub BTreeMap<NodeId, u64>);

impl VectorClock {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// A fresh clock rooted at a single coordinator with counter 1.
    pub fn single(node: &NodeId) -> Self {
        let mut counters = BTreeMap::new();
        counters.insert(node.clone(), 1);
        Self(counters)
    }

    pub fn counter(&self, node: &NodeId) -> u64 {
        self.0.get(node).copied().unwrap_or(0)
    }

    /// Returns a new clock with `node`'s counter bumped by one and every
    /// other counter preserved.
    pub fn increment(&self, node: &NodeId) -> VectorClock {
        let mut counters = self.0.clone();
        *counters.entry(node.clone()).or_insert(0) += 1;
        Self(counters)
    }

    /// Pointwise maximum over the union of both key sets. Associative and
    /// commutative; the result dominates (or equals) both inputs.
    pub fn merge(&self, other: &VectorClock) -> VectorClock {
        let mut counters = self.0.clone();
        for (node, &count) in &other.0 {
            let entry = counters.entry(node.clone()).or_insert(0);
            if count > *entry {
                *entry = count;
            }
        }
        Self(counters)
    }

    /// Compares the two clocks pointwise over the union of their keys.
    ///
    /// Never allocates beyond the returned ordering. Zero-valued counters
    /// behave exactly like absent ones.
    pub fn compare(&self, other: &VectorClock) -> ClockOrdering {
        let mut self_bigger = false;
        let mut other_bigger = false;

        for (node, &count) in &self.0 {
            let theirs = other.counter(node);
            if count > theirs {
                self_bigger = true;
            } else if theirs > count {
                other_bigger = true;
            }
        }
        for (node, &count) in &other.0 {
            if count > 0 && !self.0.contains_key(node) {
                other_bigger = true;
            }
        }

        match (self_bigger, other_bigger) {
            (true, false) => ClockOrdering::Dominates,
            (false, true) => ClockOrdering::Dominated,
            (false, false) => ClockOrdering::Equal,
            (true, true) => ClockOrdering::Concurrent,
        }
    }

    /// True when this clock is causally at-or-after `other`.
    pub fn dominates(&self, other: &VectorClock) -> bool {
        matches!(
            self.compare(other),
            ClockOrdering::Dominates | ClockOrdering::Equal
        )
    }

    /// True when this clock is strictly causally after `other`.
    pub fn strictly_dominates(&self, other: &VectorClock) -> bool {
        self.compare(other) == ClockOrdering::Dominates
    }
}
