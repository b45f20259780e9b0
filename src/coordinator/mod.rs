//! Request Coordination
//!
//! The node that receives a client request coordinates it: it computes the
//! key's preference list, fans the operation out to the replicas in
//! parallel, waits for the read or write quorum under a deadline, and
//! reconciles whatever came back. Reads additionally detect stale replicas
//! and hand them to the repair queue.

pub mod coordinator;
pub mod handlers;
pub mod protocol;
pub mod reconcile;
