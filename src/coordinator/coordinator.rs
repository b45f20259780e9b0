use super::reconcile::{find_stale_replicas, reconcile};
use crate::cluster::config::ClusterConfig;
use crate::cluster::peer::PeerClient;
use crate::cluster::types::NodeId;
use crate::metrics::recorder::Metrics;
use crate::repair::queue::{RepairQueue, RepairTask};
use crate::ring::ring::HashRing;
use crate::storage::memory::VersionStore;
use crate::version::clock::VectorClock;
use crate::version::types::Version;

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const MAX_KEY_BYTES: usize = 1024;

/// Client-visible failure of a coordinated request. Replica-level errors
/// never appear here; they are absorbed into the quorum arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Invalid key or quorum parameters; rejected before any fan-out.
    BadRequest(String),
    /// Fewer than the required successes arrived before the deadline.
    QuorumFailed,
}

/// Per-request coordination: fan-out to replicas, quorum wait, response
/// reconciliation, and repair scheduling.
///
/// Every node runs one coordinator; whichever node receives a client
/// request coordinates it. When the local node appears in a preference
/// list its operation short-circuits to storage instead of looping through
/// the HTTP transport.
pub struct Coordinator {
    local_id: NodeId,
    config: ClusterConfig,
    ring: Arc<HashRing>,
    storage: Arc<VersionStore>,
    peers: Arc<PeerClient>,
    metrics: Arc<Metrics>,
    repair: Arc<RepairQueue>,
}

impl Coordinator {
    pub fn new(
        config: ClusterConfig,
        ring: Arc<HashRing>,
        storage: Arc<VersionStore>,
        peers: Arc<PeerClient>,
        metrics: Arc<Metrics>,
        repair: Arc<RepairQueue>,
    ) -> Arc<Self> {
        Arc::new(Self {
            local_id: config.local_id.clone(),
            config,
            ring,
            storage,
            peers,
            metrics,
            repair,
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn storage(&self) -> &VersionStore {
        &self.storage
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn repair_queue(&self) -> &Arc<RepairQueue> {
        &self.repair
    }

    // ---------------- WRITE PATH ---------------- //

    /// Coordinates a client put: builds the new version from the client's
    /// causal context, replicates it to the key's preference list, and
    /// reports success once `w` replicas acknowledged.
    pub async fn put(
        &self,
        key: &str,
        value: Value,
        n: Option<usize>,
        w: Option<usize>,
        context: Option<VectorClock>,
    ) -> Result<(), RequestError> {
        let (n, w) = self.validate(key, n, w.unwrap_or(self.config.default_w))?;
        let version = Version::new(value, self.next_clock(context));

        let started = Instant::now();
        let quorum_met = self.replicate_write(key, version, n, w).await;
        self.metrics.record_write(started.elapsed(), quorum_met);

        if quorum_met {
            Ok(())
        } else {
            tracing::warn!("Write quorum failed for key {} (W={})", key, w);
            Err(RequestError::QuorumFailed)
        }
    }

    /// A delete is a put whose payload is the tombstone marker; replicas
    /// retain and replicate it like any other version.
    pub async fn delete(
        &self,
        key: &str,
        n: Option<usize>,
        w: Option<usize>,
        context: Option<VectorClock>,
    ) -> Result<(), RequestError> {
        let (n, w) = self.validate(key, n, w.unwrap_or(self.config.default_w))?;
        let tombstone = Version::tombstone(self.next_clock(context));

        let started = Instant::now();
        let quorum_met = self.replicate_write(key, tombstone, n, w).await;
        self.metrics.record_delete(started.elapsed(), quorum_met);

        if quorum_met {
            Ok(())
        } else {
            tracing::warn!("Delete quorum failed for key {} (W={})", key, w);
            Err(RequestError::QuorumFailed)
        }
    }

    /// The standard path merges the context from the client's last read and
    /// advances this coordinator's counter. Without context the clock is
    /// rooted fresh here, which deliberately conflicts with concurrent
    /// unrelated writes instead of silently overwriting them.
    fn next_clock(&self, context: Option<VectorClock>) -> VectorClock {
        match context {
            Some(context) => context.increment(&self.local_id),
            None => VectorClock::single(&self.local_id),
        }
    }

    async fn replicate_write(&self, key: &str, version: Version, n: usize, w: usize) -> bool {
        let replicas = self.ring.preference_list(key, n);
        let (tx, rx) = mpsc::channel::<bool>(replicas.len().max(1));

        let total = replicas.len();
        for peer in replicas {
            if peer == self.local_id {
                self.storage.local_put(key, version.clone());
                let _ = tx.try_send(true);
            } else {
                let peers = self.peers.clone();
                let tx = tx.clone();
                let key = key.to_string();
                let version = version.clone();
                tokio::spawn(async move {
                    let ok = peers.replica_put(&peer, &key, version).await.is_ok();
                    // The receiver may be gone once quorum resolved; the
                    // replica write itself already happened.
                    let _ = tx.send(ok).await;
                });
            }
        }
        drop(tx);

        self.await_write_quorum(rx, total, w).await
    }

    /// Consumes completions until `required` successes arrive, failure
    /// arithmetic proves the quorum unreachable, or the overall deadline
    /// fires. Outstanding replica ops keep running either way; acks beyond
    /// W are free extra durability.
    async fn await_write_quorum(
        &self,
        mut rx: mpsc::Receiver<bool>,
        total: usize,
        required: usize,
    ) -> bool {
        if required > total {
            return false;
        }
        let deadline = tokio::time::Instant::now() + self.config.request_timeout;
        let mut successes = 0usize;
        let mut failures = 0usize;

        while successes < required {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(true)) => successes += 1,
                Ok(Some(false)) => {
                    failures += 1;
                    if total - failures < required {
                        return false;
                    }
                }
                Ok(None) => return false,
                Err(_) => {
                    tracing::debug!("Write deadline expired at {}/{} acks", successes, required);
                    return false;
                }
            }
        }
        true
    }

    // ---------------- READ PATH ---------------- //

    /// Coordinates a client get: gathers version sets from `r` replicas,
    /// reconciles them into the surviving siblings, schedules repair for
    /// replicas proven stale, and returns the live versions. An empty
    /// result means not found (or deleted).
    pub async fn get(
        &self,
        key: &str,
        n: Option<usize>,
        r: Option<usize>,
    ) -> Result<Vec<Version>, RequestError> {
        let (n, r) = self.validate(key, n, r.unwrap_or(self.config.default_r))?;

        let started = Instant::now();
        let replicas = self.ring.preference_list(key, n);
        let (tx, rx) = mpsc::channel::<(NodeId, Option<Vec<Version>>)>(replicas.len().max(1));

        let total = replicas.len();
        for peer in replicas {
            if peer == self.local_id {
                let _ = tx.try_send((peer, Some(self.storage.local_get(key))));
            } else {
                let peers = self.peers.clone();
                let tx = tx.clone();
                let key = key.to_string();
                tokio::spawn(async move {
                    let result = peers.replica_get(&peer, &key).await.ok();
                    let _ = tx.send((peer, result)).await;
                });
            }
        }
        drop(tx);

        let Some(responses) = self.collect_read_responses(rx, total, r).await else {
            self.metrics.record_read(started.elapsed(), false);
            tracing::warn!("Read quorum failed for key {} (R={})", key, r);
            return Err(RequestError::QuorumFailed);
        };

        let reconciled = reconcile(
            responses
                .iter()
                .flat_map(|(_, versions)| versions.iter().cloned())
                .collect(),
        );

        let stale_peers = find_stale_replicas(&responses, &reconciled);
        if !stale_peers.is_empty() {
            tracing::debug!(
                "Read of {} found {} stale replica(s), scheduling repair",
                key,
                stale_peers.len()
            );
            self.repair.enqueue(RepairTask {
                key: key.to_string(),
                versions: reconciled.clone(),
                stale_peers,
            });
        }

        let live: Vec<Version> = reconciled
            .into_iter()
            .filter(|version| !version.tombstone)
            .collect();

        if live.len() >= 2 {
            self.metrics.record_conflict();
        }
        self.metrics.record_read(started.elapsed(), true);

        Ok(live)
    }

    /// Waits for `required` successful version sets. Once the quorum is in,
    /// completions already buffered in the channel still join the result;
    /// anything slower is left to its own devices.
    async fn collect_read_responses(
        &self,
        mut rx: mpsc::Receiver<(NodeId, Option<Vec<Version>>)>,
        total: usize,
        required: usize,
    ) -> Option<Vec<(NodeId, Vec<Version>)>> {
        if required > total {
            return None;
        }
        let deadline = tokio::time::Instant::now() + self.config.request_timeout;
        let mut responses: Vec<(NodeId, Vec<Version>)> = Vec::with_capacity(total);
        let mut failures = 0usize;

        while responses.len() < required {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some((peer, Some(versions)))) => responses.push((peer, versions)),
                Ok(Some((_, None))) => {
                    failures += 1;
                    if total - failures < required {
                        return None;
                    }
                }
                Ok(None) => return None,
                Err(_) => {
                    tracing::debug!(
                        "Read deadline expired at {}/{} responses",
                        responses.len(),
                        required
                    );
                    return None;
                }
            }
        }

        while let Ok((peer, result)) = rx.try_recv() {
            if let Some(versions) = result {
                responses.push((peer, versions));
            }
        }

        Some(responses)
    }

    // ---------------- VALIDATION ---------------- //

    /// Checks the key and quorum parameters, clamping N to the cluster
    /// size. The returned pair is what the fan-out actually uses.
    fn validate(
        &self,
        key: &str,
        n: Option<usize>,
        quorum: usize,
    ) -> Result<(usize, usize), RequestError> {
        if key.is_empty() {
            return Err(RequestError::BadRequest("key must not be empty".into()));
        }
        if key.len() > MAX_KEY_BYTES {
            return Err(RequestError::BadRequest(format!(
                "key exceeds {} bytes",
                MAX_KEY_BYTES
            )));
        }

        let n = n.unwrap_or(self.config.default_n);
        if n == 0 {
            return Err(RequestError::BadRequest("N must be at least 1".into()));
        }
        let n = n.min(self.ring.node_count());
        if n == 0 {
            return Err(RequestError::BadRequest("cluster has no nodes".into()));
        }

        if quorum == 0 || quorum > n {
            return Err(RequestError::BadRequest(format!(
                "quorum must satisfy 1 <= q <= N (got q={}, N={})",
                quorum, n
            )));
        }

        Ok((n, quorum))
    }
}
