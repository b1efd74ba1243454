//! Replica implementation
//!
//! Receives entries from the coordinator with:
//! - Deduplication by sequence id (replicate calls are retried)
//! - Simulated propagation delay and optional fault injection
//! - A gap-free read view

pub mod http;
pub mod server;
pub mod store;

pub use server::ReplicaServer;
pub use store::{IngestOutcome, ReplicaStore};
