//! Coordinator implementation
//!
//! The coordinator is responsible for:
//! - Assigning sequence ids and keeping the authoritative log
//! - Fanning writes out to replicas with retries and backoff
//! - Honouring the per-write write concern
//! - Heartbeat monitoring and read-only fencing when quorum is lost

pub mod ack;
pub mod core;
pub mod health;
pub mod http;
pub mod replication;
pub mod server;
pub mod write_log;

pub use self::core::Coordinator;
pub use ack::{AckOutcome, AckTracker};
pub use health::{HealthMonitor, QuorumState, WriteMode};
pub use replication::{ReplicationClient, RetryPolicy};
pub use server::CoordinatorServer;
pub use write_log::WriteLog;
