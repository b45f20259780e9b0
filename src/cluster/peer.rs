use super::types::NodeId;
use crate::coordinator::protocol::{
    ENDPOINT_REPLICA_GET, ENDPOINT_REPLICA_PUT, ReplicaGetResponse, ReplicaPutRequest,
};
use crate::metrics::recorder::{Metrics, PeerOutcome};
use crate::version::types::Version;

use std::sync::Arc;
use std::time::Duration;

/// How a single replica call against a remote peer failed.
///
/// These never reach clients; the coordinator absorbs them into its quorum
/// arithmetic and the metrics layer tracks them per peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerError {
    /// No response within the per-peer deadline.
    Timeout,
    /// Connection refused or broken transport.
    Connection,
    /// The peer answered with a non-success status or an unreadable body.
    Remote,
}

/// HTTP client for the internal replica API.
///
/// One shared `reqwest::Client` serves every peer; each call carries its own
/// deadline so a slow replica can never wedge a coordinator. Every call,
/// successful or not, feeds the per-peer health counters.
pub struct PeerClient {
    http: reqwest::Client,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl PeerClient {
    pub fn new(timeout: Duration, metrics: Arc<Metrics>) -> Arc<Self> {
        Arc::new(Self {
            http: reqwest::Client::new(),
            timeout,
            metrics,
        })
    }

    /// Pushes one version at a peer's replica store.
    pub async fn replica_put(
        &self,
        peer: &NodeId,
        key: &str,
        version: Version,
    ) -> Result<(), PeerError> {
        let payload = ReplicaPutRequest {
            key: key.to_string(),
            version,
        };
        let url = format!("http://{}{}", peer, ENDPOINT_REPLICA_PUT);

        let outcome = match self
            .http
            .post(url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                tracing::warn!(
                    "Replica put to {} rejected with {}",
                    peer,
                    response.status()
                );
                Err(PeerError::Remote)
            }
            Err(e) => Err(classify(&e)),
        };

        self.record(peer, outcome.as_ref().err().copied());
        outcome
    }

    /// Fetches a peer's entire local version set for a key.
    pub async fn replica_get(&self, peer: &NodeId, key: &str) -> Result<Vec<Version>, PeerError> {
        let url = format!("http://{}{}", peer, ENDPOINT_REPLICA_GET);

        let outcome = match self
            .http
            .get(url)
            .query(&[("key", key)])
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                match response.json::<ReplicaGetResponse>().await {
                    Ok(body) => Ok(body.versions),
                    Err(e) => {
                        tracing::warn!("Replica get from {} returned bad body: {}", peer, e);
                        Err(PeerError::Remote)
                    }
                }
            }
            Ok(response) => {
                tracing::warn!(
                    "Replica get from {} rejected with {}",
                    peer,
                    response.status()
                );
                Err(PeerError::Remote)
            }
            Err(e) => Err(classify(&e)),
        };

        self.record(peer, outcome.as_ref().err().copied());
        outcome
    }

    fn record(&self, peer: &NodeId, error: Option<PeerError>) {
        let outcome = match error {
            None => PeerOutcome::Success,
            Some(PeerError::Timeout) => PeerOutcome::Timeout,
            Some(_) => PeerOutcome::Failure,
        };
        self.metrics.record_peer_response(peer, outcome);
    }
}

fn classify(error: &reqwest::Error) -> PeerError {
    if error.is_timeout() {
        PeerError::Timeout
    } else {
        // reqwest folds refused connections, resets and DNS trouble into
        // connect/request errors; all of them mean the peer was unreachable.
        PeerError::Connection
    }
}
