use crate::cluster::peer::PeerClient;
use crate::cluster::types::NodeId;
use crate::metrics::recorder::Metrics;
use crate::storage::memory::VersionStore;
use crate::version::types::Version;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Bound on pending repair tasks per node.
pub const DEFAULT_REPAIR_CAPACITY: usize = 1024;

/// One unit of repair work produced by a read: push `versions` to every
/// peer in `stale_peers`.
#[derive(Debug, Clone)]
pub struct RepairTask {
    pub key: String,
    pub versions: Vec<Version>,
    pub stale_peers: Vec<NodeId>,
}

/// Bounded task queue between read coordinators and the repair workers.
///
/// `enqueue` never blocks a live request: when the queue is full the oldest
/// pending task is dropped and counted. Losing a task is safe; the next
/// read of the key rediscovers the staleness.
pub struct RepairQueue {
    tasks: Mutex<VecDeque<RepairTask>>,
    notify: Notify,
    capacity: usize,
    metrics: Arc<Metrics>,
}

impl RepairQueue {
    pub fn new(capacity: usize, metrics: Arc<Metrics>) -> Arc<Self> {
        Arc::new(Self {
            tasks: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            capacity: capacity.max(1),
            metrics,
        })
    }

    pub fn enqueue(&self, task: RepairTask) {
        {
            let mut tasks = self
                .tasks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if tasks.len() == self.capacity {
                tasks.pop_front();
                self.metrics.record_dropped_repair();
                tracing::warn!("Repair queue full; dropped oldest pending task");
            }
            tasks.push_back(task);
        }
        self.notify.notify_one();
    }

    /// Next pending task, waiting for one if the queue is empty.
    pub async fn next(&self) -> RepairTask {
        loop {
            {
                let mut tasks = self
                    .tasks
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Some(task) = tasks.pop_front() {
                    return task;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Background workers draining the repair queue.
///
/// Failures are logged and counted but never retried here; subsequent reads
/// regenerate the task if the replica is still behind.
pub struct RepairPool {
    queue: Arc<RepairQueue>,
    peers: Arc<PeerClient>,
    storage: Arc<VersionStore>,
    local_id: NodeId,
    metrics: Arc<Metrics>,
    worker_count: usize,
}

impl RepairPool {
    pub fn new(
        queue: Arc<RepairQueue>,
        peers: Arc<PeerClient>,
        storage: Arc<VersionStore>,
        local_id: NodeId,
        metrics: Arc<Metrics>,
        worker_count: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            peers,
            storage,
            local_id,
            metrics,
            worker_count: worker_count.max(1),
        })
    }

    pub async fn start(self: Arc<Self>) {
        tracing::info!("Starting {} repair workers", self.worker_count);
        for worker_id in 0..self.worker_count {
            let pool = self.clone();
            tokio::spawn(async move {
                pool.worker_loop(worker_id).await;
            });
        }
    }

    async fn worker_loop(&self, worker_id: usize) {
        tracing::debug!("Repair worker {} started", worker_id);
        loop {
            let task = self.queue.next().await;
            self.apply(task).await;
        }
    }

    async fn apply(&self, task: RepairTask) {
        for peer in &task.stale_peers {
            for version in &task.versions {
                if *peer == self.local_id {
                    self.storage.local_put(&task.key, version.clone());
                    self.metrics.record_read_repair(true);
                    continue;
                }

                match self
                    .peers
                    .replica_put(peer, &task.key, version.clone())
                    .await
                {
                    Ok(()) => {
                        tracing::debug!("Repaired {} on {}", task.key, peer);
                        self.metrics.record_read_repair(true);
                    }
                    Err(e) => {
                        tracing::debug!("Repair of {} on {} failed: {:?}", task.key, peer, e);
                        self.metrics.record_read_repair(false);
                    }
                }
            }
        }
    }
}
