//! Wire Protocol
//!
//! Endpoint paths and DTOs for both API surfaces: the client-facing
//! key-value API (`/kv/{key}`, `/metrics`) and the internal replica API
//! peers call on each other (`/_replica/put`, `/_replica/get`).

use crate::version::clock::VectorClock;
use crate::version::types::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- API Endpoints ---

/// Client-facing key-value path (parameterized by key).
pub const ENDPOINT_KV: &str = "/kv/:key";
/// Read-only metrics snapshot.
pub const ENDPOINT_METRICS: &str = "/metrics";
/// Internal endpoint replicas expose for coordinated writes and repair.
pub const ENDPOINT_REPLICA_PUT: &str = "/_replica/put";
/// Internal endpoint returning a replica's entire local version set.
pub const ENDPOINT_REPLICA_GET: &str = "/_replica/get";

// --- Client API DTOs ---

/// Body of a client PUT. `N`/`W` fall back to the cluster defaults;
/// `context` carries the vector clock of a previous read so the write
/// supersedes the versions the client saw.
#[derive(Debug, Deserialize)]
pub struct PutRequest {
    pub value: Option<Value>,
    #[serde(rename = "N")]
    pub n: Option<usize>,
    #[serde(rename = "W")]
    pub w: Option<usize>,
    pub context: Option<VectorClock>,
}

/// Body of a client DELETE; a PUT without a payload.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "N")]
    pub n: Option<usize>,
    #[serde(rename = "W")]
    pub w: Option<usize>,
    pub context: Option<VectorClock>,
}

/// Query string of a client GET.
#[derive(Debug, Default, Deserialize)]
pub struct GetParams {
    #[serde(rename = "R")]
    pub r: Option<usize>,
    #[serde(rename = "N")]
    pub n: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One client-visible version. Tombstones never appear here, so the wire
/// shape is just payload plus causal context.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientVersion {
    pub value: Value,
    pub vector_clock: VectorClock,
}

impl From<Version> for ClientVersion {
    fn from(version: Version) -> Self {
        Self {
            value: version.value,
            vector_clock: version.vector_clock,
        }
    }
}

/// Client GET response. An empty list means not found or deleted.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub versions: Vec<ClientVersion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// --- Internal replica API DTOs ---

/// Replica write pushed by a coordinator (or by a repair worker). Flattening
/// the version keeps the body `{key, value, vector_clock, tombstone}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaPutRequest {
    pub key: String,
    #[serde(flatten)]
    pub version: Version,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaPutResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReplicaGetQuery {
    pub key: String,
}

/// A replica's full local version set, tombstones included.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaGetResponse {
    pub versions: Vec<Version>,
}
