use crate::version::clock::ClockOrdering;
use crate::version::types::Version;

use dashmap::DashMap;
use std::sync::Arc;

/// In-memory per-key version sets.
///
/// Each key maps to a non-empty list of versions whose clocks are pairwise
/// concurrent. The `DashMap` entry API holds the shard lock for the whole
/// merge, so writes to one key are serialized while reads and writes to
/// other keys proceed in parallel.
pub struct VersionStore {
    data: Arc<DashMap<String, Vec<Version>>>,
}

impl VersionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            data: Arc::new(DashMap::new()),
        })
    }

    /// Snapshot of the current version set for a key (possibly empty).
    /// Tombstones are returned like any other version; filtering them is
    /// the reader's concern.
    pub fn local_get(&self, key: &str) -> Vec<Version> {
        self.data
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Integrates `incoming` into the key's version set.
    ///
    /// Rules, applied atomically under the key's lock:
    /// 1. If an existing version strictly dominates `incoming`, the write is
    ///    obsolete and nothing changes.
    /// 2. Every existing version strictly dominated by `incoming` is removed.
    /// 3. An existing version with an equal clock collapses to `incoming`
    ///    (last seen value wins within one causal frame).
    /// 4. Otherwise `incoming` joins the set as a sibling.
    ///
    /// Repeated or reordered calls converge on the same set, which is what
    /// makes replication retries and read repair safe.
    pub fn local_put(&self, key: &str, incoming: Version) {
        let mut entry = self.data.entry(key.to_string()).or_default();
        let versions = entry.value_mut();

        if versions
            .iter()
            .any(|v| v.vector_clock.strictly_dominates(&incoming.vector_clock))
        {
            tracing::trace!("Dropping obsolete write for key {}", key);
            return;
        }

        versions.retain(|v| !incoming.vector_clock.strictly_dominates(&v.vector_clock));

        if let Some(existing) = versions
            .iter_mut()
            .find(|v| v.vector_clock.compare(&incoming.vector_clock) == ClockOrdering::Equal)
        {
            *existing = incoming;
        } else {
            versions.push(incoming);
        }
    }

    /// Same merge as `local_put`; the tombstone payload is what marks the
    /// key deleted once it dominates every live version.
    pub fn local_delete(&self, key: &str, tombstone: Version) {
        self.local_put(key, tombstone);
    }

    pub fn key_count(&self) -> usize {
        self.data.len()
    }

    pub fn version_count(&self) -> usize {
        self.data.iter().map(|entry| entry.value().len()).sum()
    }
}
