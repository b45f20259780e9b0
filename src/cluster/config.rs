use super::types::NodeId;
use anyhow::Result;
use std::time::Duration;

pub const DEFAULT_VNODES: usize = 128;
pub const DEFAULT_N: usize = 3;
pub const DEFAULT_W: usize = 2;
pub const DEFAULT_R: usize = 2;
pub const DEFAULT_PEER_TIMEOUT_MS: u64 = 1000;

/// Startup configuration for one node.
///
/// Parsed from the command line; every peer must be started with the same
/// `--peers` list so that all nodes build the same ring.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// This node's identity; the `--peers` entry whose port matches `--port`.
    pub local_id: NodeId,
    pub port: u16,
    /// Full fixed peer set, local node included, in the configured order.
    pub peers: Vec<NodeId>,
    pub vnodes: usize,
    pub default_n: usize,
    pub default_w: usize,
    pub default_r: usize,
    /// Deadline for a single replica call.
    pub peer_timeout: Duration,
    /// Deadline for a whole coordinated request.
    pub request_timeout: Duration,
}

impl ClusterConfig {
    /// Parses `--flag value` pairs the way the node binary receives them
    /// (without the program name).
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut port: Option<u16> = None;
        let mut peers_raw: Option<String> = None;
        let mut vnodes = DEFAULT_VNODES;
        let mut default_n = DEFAULT_N;
        let mut default_w = DEFAULT_W;
        let mut default_r = DEFAULT_R;
        let mut peer_timeout_ms = DEFAULT_PEER_TIMEOUT_MS;
        let mut request_timeout_ms: Option<u64> = None;

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let Some(value) = args.get(i + 1) else {
                return Err(anyhow::anyhow!("missing value for {}", flag));
            };
            match flag {
                "--port" => port = Some(value.parse()?),
                "--peers" => peers_raw = Some(value.clone()),
                "--vnodes" => vnodes = value.parse()?,
                "--default-n" => default_n = value.parse()?,
                "--default-w" => default_w = value.parse()?,
                "--default-r" => default_r = value.parse()?,
                "--peer-timeout-ms" => peer_timeout_ms = value.parse()?,
                "--request-timeout-ms" => request_timeout_ms = Some(value.parse()?),
                other => return Err(anyhow::anyhow!("unknown flag {}", other)),
            }
            i += 2;
        }

        let Some(port) = port else {
            return Err(anyhow::anyhow!("--port is required"));
        };
        let Some(peers_raw) = peers_raw else {
            return Err(anyhow::anyhow!("--peers is required"));
        };

        let peers = normalize_peer_list(&peers_raw)?;
        let local_id = find_local_id(&peers, port)?;

        if vnodes == 0 {
            return Err(anyhow::anyhow!("--vnodes must be at least 1"));
        }
        validate_quorum_defaults(default_n, default_w, default_r, peers.len())?;

        // Overall deadline defaults to twice the per-peer deadline.
        let request_timeout_ms = request_timeout_ms.unwrap_or(peer_timeout_ms * 2);

        Ok(Self {
            local_id,
            port,
            peers,
            vnodes,
            default_n,
            default_w,
            default_r,
            peer_timeout: Duration::from_millis(peer_timeout_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }

    /// "strong" when the default quorums overlap (`R + W > N`), otherwise
    /// "eventual".
    pub fn consistency_level(&self) -> &'static str {
        if self.default_r + self.default_w > self.default_n {
            "strong"
        } else {
            "eventual"
        }
    }
}

fn normalize_peer_list(raw: &str) -> Result<Vec<NodeId>> {
    let mut peers = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let peer = NodeId::parse(part)?;
        if !peers.contains(&peer) {
            peers.push(peer);
        }
    }
    if peers.is_empty() {
        return Err(anyhow::anyhow!("--peers must name at least one node"));
    }
    Ok(peers)
}

fn find_local_id(peers: &[NodeId], port: u16) -> Result<NodeId> {
    let suffix = format!(":{}", port);
    let matches: Vec<&NodeId> = peers
        .iter()
        .filter(|peer| peer.0.ends_with(&suffix))
        .collect();

    match matches.as_slice() {
        [only] => Ok((*only).clone()),
        [] => Err(anyhow::anyhow!(
            "--peers must include this node (no entry with port {})",
            port
        )),
        _ => Err(anyhow::anyhow!(
            "multiple --peers entries share port {}; cannot tell which is local",
            port
        )),
    }
}

fn validate_quorum_defaults(n: usize, w: usize, r: usize, cluster_size: usize) -> Result<()> {
    if n == 0 || w == 0 || r == 0 {
        return Err(anyhow::anyhow!("N, W and R must all be at least 1"));
    }
    if w > n || r > n {
        return Err(anyhow::anyhow!(
            "quorums must not exceed the replication factor (N={}, W={}, R={})",
            n,
            w,
            r
        ));
    }
    if n > cluster_size {
        return Err(anyhow::anyhow!(
            "default N={} exceeds cluster size {}",
            n,
            cluster_size
        ));
    }
    Ok(())
}
