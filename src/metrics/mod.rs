//! Node Metrics
//!
//! Counters, rolling latency windows, and per-peer health for a single node.
//! Everything is updated from hot request paths, so counters are atomics and
//! the latency reservoirs hide behind short-held mutexes. A read-only
//! snapshot feeds the `/metrics` endpoint.

pub mod recorder;

#[cfg(test)]
mod tests;
