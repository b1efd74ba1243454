//! # replog
//!
//! A single-leader replicated append-only log with:
//! - Monotonic sequence ids assigned by one coordinator
//! - Per-write write concern (`w`): answer once `w` copies exist
//! - Retried, idempotent delivery with exponential backoff
//! - Heartbeat-driven replica health and read-only fencing on quorum loss
//! - Gap-free reads on every replica
//!
//! ## Architecture
//!
//! ```text
//!            POST /messages {message, w}
//!                     │
//! ┌───────────────────▼─────────────────────┐
//! │               Coordinator               │
//! │  WriteLog ─ AckTracker ─ HealthMonitor  │
//! └───────┬──────────────────────┬──────────┘
//!         │ /replicate           │ /heartbeat
//!   ┌─────▼──────┐         ┌─────▼──────┐
//!   │ Replica 1  │   ...   │ Replica N  │
//!   │ dedup + gap│         │ dedup + gap│
//!   │ -free view │         │ -free view │
//!   └────────────┘         └────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start two replicas
//! ```bash
//! replog-replica --id replica-1 --bind 0.0.0.0:5001
//! replog-replica --id replica-2 --bind 0.0.0.0:5002
//! ```
//!
//! ### Start the coordinator
//! ```bash
//! replog-coord serve --id coord-1 --bind 0.0.0.0:5000 \
//!   --replicas http://localhost:5001,http://localhost:5002 \
//!   --quorum 2
//! ```
//!
//! ### Use the CLI
//! ```bash
//! replog write "hello" --w 2
//! replog read
//! replog quorum
//! replog replica-read --replica http://localhost:5001
//! ```

pub mod common;
pub mod coordinator;
pub mod ops;
pub mod replica;

// Re-export commonly used types
pub use common::{Config, Entry, Error, Result};
pub use coordinator::{Coordinator, CoordinatorServer};
pub use replica::{ReplicaServer, ReplicaStore};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
