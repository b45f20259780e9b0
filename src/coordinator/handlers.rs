//! HTTP Handlers
//!
//! Bridges between axum and the coordinator: the client key-value API, the
//! internal replica API, and the metrics snapshot. Handlers translate
//! coordinator outcomes into the status codes clients see; replica-level
//! failures never surface here.

use super::coordinator::{Coordinator, RequestError};
use super::protocol::{
    ClientVersion, DeleteRequest, ENDPOINT_KV, ENDPOINT_METRICS, ENDPOINT_REPLICA_GET,
    ENDPOINT_REPLICA_PUT, ErrorResponse, GetParams, GetResponse, PutRequest, PutResponse,
    ReplicaGetQuery, ReplicaGetResponse, ReplicaPutRequest, ReplicaPutResponse,
};
use crate::metrics::recorder::MetricsSnapshot;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use sysinfo::System;

/// Full route table for one node: client API, replica API, metrics.
pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route(
            ENDPOINT_KV,
            axum::routing::put(handle_put)
                .get(handle_get)
                .delete(handle_delete),
        )
        .route(ENDPOINT_METRICS, get(handle_metrics))
        .route(ENDPOINT_REPLICA_PUT, post(handle_replica_put))
        .route(ENDPOINT_REPLICA_GET, get(handle_replica_get))
        .layer(Extension(coordinator))
}

// --- Client API ---

pub async fn handle_put(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
    Json(req): Json<PutRequest>,
) -> Response {
    let Some(value) = req.value else {
        return bad_request("missing value");
    };

    match coordinator.put(&key, value, req.n, req.w, req.context).await {
        Ok(()) => write_success(),
        Err(e) => write_failure(e),
    }
}

pub async fn handle_get(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
    Query(params): Query<GetParams>,
) -> Response {
    match coordinator.get(&key, params.n, params.r).await {
        Ok(versions) => (
            StatusCode::OK,
            Json(GetResponse {
                versions: versions.into_iter().map(ClientVersion::from).collect(),
            }),
        )
            .into_response(),
        Err(RequestError::BadRequest(message)) => bad_request(&message),
        Err(RequestError::QuorumFailed) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "quorum".to_string(),
            }),
        )
            .into_response(),
    }
}

pub async fn handle_delete(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
    body: Option<Json<DeleteRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    match coordinator.delete(&key, req.n, req.w, req.context).await {
        Ok(()) => write_success(),
        Err(e) => write_failure(e),
    }
}

// --- Internal replica API ---

/// Applies one pushed version to local storage. Invoked by remote
/// coordinators during writes and by repair workers; the storage merge
/// makes it idempotent.
pub async fn handle_replica_put(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Json(req): Json<ReplicaPutRequest>,
) -> (StatusCode, Json<ReplicaPutResponse>) {
    coordinator.storage().local_put(&req.key, req.version);
    (StatusCode::OK, Json(ReplicaPutResponse { ok: true }))
}

/// Serves this node's entire local version set for a key, tombstones
/// included; reconciliation happens at the calling coordinator.
pub async fn handle_replica_get(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Query(query): Query<ReplicaGetQuery>,
) -> (StatusCode, Json<ReplicaGetResponse>) {
    let versions = coordinator.storage().local_get(&query.key);
    (StatusCode::OK, Json(ReplicaGetResponse { versions }))
}

// --- Metrics ---

#[derive(Serialize)]
pub struct ProcessStats {
    cpu_usage: f32,
    mem_used_mb: u64,
    mem_total_mb: u64,
}

#[derive(Serialize)]
pub struct NodeMetricsResponse {
    node_id: String,
    cluster_size: usize,
    consistency: &'static str,
    keys: usize,
    stored_versions: usize,
    pending_repairs: usize,
    #[serde(flatten)]
    metrics: MetricsSnapshot,
    process: ProcessStats,
}

pub async fn handle_metrics(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> Json<NodeMetricsResponse> {
    let config = coordinator.config();

    let mut sys = System::new_all();
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu_usage = sys.global_cpu_info().cpu_usage();
    // sysinfo reports memory in bytes.
    let mem_total_mb = sys.total_memory() / (1024 * 1024);
    let mem_used_mb = sys.used_memory() / (1024 * 1024);

    Json(NodeMetricsResponse {
        node_id: config.local_id.0.clone(),
        cluster_size: config.peers.len(),
        consistency: config.consistency_level(),
        keys: coordinator.storage().key_count(),
        stored_versions: coordinator.storage().version_count(),
        pending_repairs: coordinator.repair_queue().pending(),
        metrics: coordinator.metrics().snapshot(),
        process: ProcessStats {
            cpu_usage,
            mem_used_mb,
            mem_total_mb,
        },
    })
}

// --- Helpers ---

fn write_success() -> Response {
    (
        StatusCode::OK,
        Json(PutResponse {
            success: true,
            reason: None,
        }),
    )
        .into_response()
}

fn write_failure(error: RequestError) -> Response {
    match error {
        RequestError::BadRequest(message) => bad_request(&message),
        RequestError::QuorumFailed => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(PutResponse {
                success: false,
                reason: Some("quorum".to_string()),
            }),
        )
            .into_response(),
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
