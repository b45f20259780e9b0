use super::clock::VectorClock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single causally-tagged value held for a key.
///
/// The payload is opaque JSON chosen by the client; the store never looks
/// inside it. A tombstone occupies a version slot like any other value and
/// takes part in dominance comparisons, but is hidden from client reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Version {
    pub value: Value,
    pub vector_clock: VectorClock,
    #[serde(default)]
    pub tombstone: bool,
}

impl Version {
    pub fn new(value: Value, vector_clock: VectorClock) -> Self {
        Self {
            value,
            vector_clock,
            tombstone: false,
        }
    }

    /// A deletion marker carrying only its causal position.
    pub fn tombstone(vector_clock: VectorClock) -> Self {
        Self {
            value: Value::Null,
            vector_clock,
            tombstone: true,
        }
    }
}
