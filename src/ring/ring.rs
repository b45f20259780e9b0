use crate::cluster::types::NodeId;
use std::collections::HashSet;

/// Immutable consistent hash ring with virtual nodes.
///
/// ## Mechanism
/// - **Placement**: each peer contributes `vnodes` positions, hashed from
///   `"{node_id}:{i}"`. Positions are MD5 digests truncated to a big-endian
///   `u64`, so every node computes the same ring from the same peer list.
/// - **Lookup**: a key hashes to a position; walking clockwise from there
///   and collecting distinct peers yields its preference list.
///
/// Position ties are broken by node id order through the `(u64, NodeId)`
/// tuple sort.
pub struct HashRing {
    positions: Vec<(u64, NodeId)>,
    distinct_nodes: usize,
}

impl HashRing {
    pub fn new(nodes: &[NodeId], vnodes: usize) -> Self {
        let vnodes = vnodes.max(1);
        let mut positions = Vec::with_capacity(nodes.len() * vnodes);

        for node in nodes {
            for i in 0..vnodes {
                let position = hash_bytes(format!("{}:{}", node, i).as_bytes());
                positions.push((position, node.clone()));
            }
        }
        positions.sort();

        let distinct_nodes = nodes.iter().collect::<HashSet<_>>().len();

        Self {
            positions,
            distinct_nodes,
        }
    }

    /// Hashes a key to its ring position.
    pub fn hash_key(key: &str) -> u64 {
        hash_bytes(key.as_bytes())
    }

    /// Number of distinct physical peers on the ring.
    pub fn node_count(&self) -> usize {
        self.distinct_nodes
    }

    /// Ordered list of the first `n` distinct peers found walking clockwise
    /// from the key's position, wrapping at the end of the ring.
    ///
    /// If fewer than `n` distinct peers exist, every peer is returned. The
    /// result depends only on the ring contents, never on call order.
    pub fn preference_list(&self, key: &str, n: usize) -> Vec<NodeId> {
        if self.positions.is_empty() || n == 0 {
            return Vec::new();
        }

        let h = Self::hash_key(key);
        let start = self.positions.partition_point(|(position, _)| *position < h);
        let len = self.positions.len();
        let wanted = n.min(self.distinct_nodes);

        let mut result: Vec<NodeId> = Vec::with_capacity(wanted);
        for offset in 0..len {
            let (_, node) = &self.positions[(start + offset) % len];
            if !result.contains(node) {
                result.push(node.clone());
                if result.len() == wanted {
                    break;
                }
            }
        }

        result
    }
}

fn hash_bytes(data: &[u8]) -> u64 {
    let digest = md5::compute(data).0;
    u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}
