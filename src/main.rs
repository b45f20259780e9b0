use quorumkv::cluster::config::ClusterConfig;
use quorumkv::cluster::peer::PeerClient;
use quorumkv::coordinator::coordinator::Coordinator;
use quorumkv::coordinator::handlers;
use quorumkv::metrics::recorder::Metrics;
use quorumkv::repair::queue::{DEFAULT_REPAIR_CAPACITY, RepairPool, RepairQueue};
use quorumkv::ring::ring::HashRing;
use quorumkv::storage::memory::VersionStore;

use std::net::SocketAddr;
use std::sync::Arc;

const REPAIR_WORKERS: usize = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() {
        eprintln!(
            "Usage: quorumkv --port <port> --peers <host:port,host:port,...> \
             [--vnodes <n>] [--default-n <n>] [--default-w <n>] [--default-r <n>] \
             [--peer-timeout-ms <ms>] [--request-timeout-ms <ms>]"
        );
        eprintln!(
            "Example: quorumkv --port 5001 \
             --peers 127.0.0.1:5001,127.0.0.1:5002,127.0.0.1:5003"
        );
        std::process::exit(1);
    }

    let config = ClusterConfig::from_args(&args)?;

    tracing::info!(
        "Starting node {} ({} peers, {} vnodes per node)",
        config.local_id,
        config.peers.len(),
        config.vnodes
    );
    tracing::info!(
        "Quorum defaults N={} W={} R={} ({} consistency)",
        config.default_n,
        config.default_w,
        config.default_r,
        config.consistency_level()
    );

    // 1. Process-wide state: ring is immutable, the rest is shared mutable.
    let metrics = Metrics::new();
    let storage = VersionStore::new();
    let ring = Arc::new(HashRing::new(&config.peers, config.vnodes));
    let peers = PeerClient::new(config.peer_timeout, metrics.clone());

    // 2. Read repair pipeline:
    let repair_queue = RepairQueue::new(DEFAULT_REPAIR_CAPACITY, metrics.clone());
    let repair_pool = RepairPool::new(
        repair_queue.clone(),
        peers.clone(),
        storage.clone(),
        config.local_id.clone(),
        metrics.clone(),
        REPAIR_WORKERS,
    );
    repair_pool.start().await;

    // 3. Coordinator + HTTP router:
    let port = config.port;
    let coordinator = Coordinator::new(config, ring, storage, peers, metrics, repair_queue);
    let app = handlers::router(coordinator);

    // 4. Serve until shutdown:
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTP server listening on {}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
