//! Read Repair
//!
//! Reads that observe stale replicas enqueue repair tasks here instead of
//! blocking on convergence. A small worker pool drains the queue and pushes
//! the reconciled versions at the stale peers through the ordinary replica
//! write path; storage's idempotent merge makes repeated or reordered
//! pushes harmless.

pub mod queue;
