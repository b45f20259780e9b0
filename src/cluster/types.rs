use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a peer, of the form `host:port`.
///
/// The peer set is fixed at startup and must be identical on every node;
/// the id doubles as the address the peer client dials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    /// Parses and validates a `host:port` identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let Some((host, port)) = raw.rsplit_once(':') else {
            return Err(anyhow::anyhow!(
                "invalid node id {:?}: expected host:port",
                raw
            ));
        };
        if host.is_empty() {
            return Err(anyhow::anyhow!("invalid node id {:?}: empty host", raw));
        }
        if port.parse::<u16>().is_err() {
            return Err(anyhow::anyhow!("invalid node id {:?}: bad port", raw));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
