use crate::cluster::types::NodeId;

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Rolling window size for latency samples, matching one reservoir per op
/// type.
const LATENCY_WINDOW: usize = 1000;

/// How a single replica call against a peer ended, as seen by the peer
/// client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerOutcome {
    Success,
    Timeout,
    Failure,
}

#[derive(Default)]
struct PeerHealth {
    total: AtomicU64,
    successes: AtomicU64,
    timeouts: AtomicU64,
}

struct Reservoir {
    samples: Mutex<Vec<f64>>,
}

impl Reservoir {
    fn new() -> Self {
        Self {
            samples: Mutex::new(Vec::with_capacity(LATENCY_WINDOW)),
        }
    }

    fn record(&self, millis: f64) {
        let mut samples = self
            .samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if samples.len() == LATENCY_WINDOW {
            samples.remove(0);
        }
        samples.push(millis);
    }

    fn stats(&self) -> LatencyStats {
        let samples = self
            .samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if samples.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = samples.clone();
        drop(samples);
        sorted.sort_by(|a, b| a.total_cmp(b));

        let p95_idx = ((sorted.len() as f64) * 0.95) as usize;
        LatencyStats {
            avg: sorted.iter().sum::<f64>() / sorted.len() as f64,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p95: sorted[p95_idx.min(sorted.len() - 1)],
        }
    }
}

/// Node-wide metric registry.
pub struct Metrics {
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    conflicts_returned: AtomicU64,
    read_repairs: AtomicU64,
    read_repair_failures: AtomicU64,
    dropped_repairs: AtomicU64,

    read_quorum_successes: AtomicU64,
    read_quorum_failures: AtomicU64,
    write_quorum_successes: AtomicU64,
    write_quorum_failures: AtomicU64,
    delete_quorum_successes: AtomicU64,
    delete_quorum_failures: AtomicU64,

    read_latency: Reservoir,
    write_latency: Reservoir,
    delete_latency: Reservoir,

    peer_health: DashMap<NodeId, PeerHealth>,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            conflicts_returned: AtomicU64::new(0),
            read_repairs: AtomicU64::new(0),
            read_repair_failures: AtomicU64::new(0),
            dropped_repairs: AtomicU64::new(0),
            read_quorum_successes: AtomicU64::new(0),
            read_quorum_failures: AtomicU64::new(0),
            write_quorum_successes: AtomicU64::new(0),
            write_quorum_failures: AtomicU64::new(0),
            delete_quorum_successes: AtomicU64::new(0),
            delete_quorum_failures: AtomicU64::new(0),
            read_latency: Reservoir::new(),
            write_latency: Reservoir::new(),
            delete_latency: Reservoir::new(),
            peer_health: DashMap::new(),
        })
    }

    pub fn record_read(&self, latency: Duration, quorum_success: bool) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.read_latency.record(latency.as_secs_f64() * 1000.0);
        if quorum_success {
            self.read_quorum_successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.read_quorum_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_write(&self, latency: Duration, quorum_success: bool) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.write_latency.record(latency.as_secs_f64() * 1000.0);
        if quorum_success {
            self.write_quorum_successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.write_quorum_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_delete(&self, latency: Duration, quorum_success: bool) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.delete_latency.record(latency.as_secs_f64() * 1000.0);
        if quorum_success {
            self.delete_quorum_successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.delete_quorum_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// One increment per read whose reconciled set held two or more live
    /// siblings.
    pub fn record_conflict(&self) {
        self.conflicts_returned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_repair(&self, success: bool) {
        if success {
            self.read_repairs.fetch_add(1, Ordering::Relaxed);
        } else {
            self.read_repair_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_dropped_repair(&self) {
        self.dropped_repairs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_peer_response(&self, peer: &NodeId, outcome: PeerOutcome) {
        let health = self.peer_health.entry(peer.clone()).or_default();
        health.total.fetch_add(1, Ordering::Relaxed);
        match outcome {
            PeerOutcome::Success => {
                health.successes.fetch_add(1, Ordering::Relaxed);
            }
            PeerOutcome::Timeout => {
                health.timeouts.fetch_add(1, Ordering::Relaxed);
            }
            PeerOutcome::Failure => {}
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let read_successes = self.read_quorum_successes.load(Ordering::Relaxed);
        let read_failures = self.read_quorum_failures.load(Ordering::Relaxed);
        let write_successes = self.write_quorum_successes.load(Ordering::Relaxed);
        let write_failures = self.write_quorum_failures.load(Ordering::Relaxed);
        let delete_successes = self.delete_quorum_successes.load(Ordering::Relaxed);
        let delete_failures = self.delete_quorum_failures.load(Ordering::Relaxed);

        let peer_health = self
            .peer_health
            .iter()
            .map(|entry| {
                let total = entry.value().total.load(Ordering::Relaxed);
                let successes = entry.value().successes.load(Ordering::Relaxed);
                let timeouts = entry.value().timeouts.load(Ordering::Relaxed);
                (
                    entry.key().0.clone(),
                    PeerHealthSnapshot {
                        total_requests: total,
                        successes,
                        timeouts,
                        success_rate: rate(successes, total),
                        timeout_rate: rate(timeouts, total),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            operations: OperationCounters {
                reads: self.reads.load(Ordering::Relaxed),
                writes: self.writes.load(Ordering::Relaxed),
                deletes: self.deletes.load(Ordering::Relaxed),
                read_repairs: self.read_repairs.load(Ordering::Relaxed),
                read_repair_failures: self.read_repair_failures.load(Ordering::Relaxed),
                conflicts_returned: self.conflicts_returned.load(Ordering::Relaxed),
                quorum_failures: read_failures + write_failures + delete_failures,
                dropped_repairs: self.dropped_repairs.load(Ordering::Relaxed),
            },
            quorum: QuorumRates {
                read_successes,
                read_failures,
                read_success_rate: rate(read_successes, read_successes + read_failures),
                write_successes,
                write_failures,
                write_success_rate: rate(write_successes, write_successes + write_failures),
                delete_successes,
                delete_failures,
                delete_success_rate: rate(delete_successes, delete_successes + delete_failures),
            },
            latency_ms: LatencyByOp {
                read: self.read_latency.stats(),
                write: self.write_latency.stats(),
                delete: self.delete_latency.stats(),
            },
            peer_health,
        }
    }
}

fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationCounters {
    pub reads: u64,
    pub writes: u64,
    pub deletes: u64,
    pub read_repairs: u64,
    pub read_repair_failures: u64,
    pub conflicts_returned: u64,
    pub quorum_failures: u64,
    pub dropped_repairs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuorumRates {
    pub read_successes: u64,
    pub read_failures: u64,
    pub read_success_rate: f64,
    pub write_successes: u64,
    pub write_failures: u64,
    pub write_success_rate: f64,
    pub delete_successes: u64,
    pub delete_failures: u64,
    pub delete_success_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LatencyStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyByOp {
    pub read: LatencyStats,
    pub write: LatencyStats,
    pub delete: LatencyStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeerHealthSnapshot {
    pub total_requests: u64,
    pub successes: u64,
    pub timeouts: u64,
    pub success_rate: f64,
    pub timeout_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub operations: OperationCounters,
    pub quorum: QuorumRates,
    pub latency_ms: LatencyByOp,
    pub peer_health: BTreeMap<String, PeerHealthSnapshot>,
}
