//! Common utilities and types shared across replog

pub mod config;
pub mod entry;
pub mod error;
pub mod tracing_middleware;
pub mod utils;

pub use self::config::{Config, CoordinatorConfig, ReplicaConfig};
pub use entry::{Entry, MessagesResponse, ReplicateRequest};
pub use error::{Error, Result};
pub use utils::{backoff_delay, normalize_url, parse_duration, ReplicaHealth};
