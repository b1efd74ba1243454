//! Configuration for replog components
//!
//! Values come from an optional TOML file (`replog.toml`, or the path in
//! `REPLOG_CONFIG`) layered under `REPLOG_*` environment variables. Nested
//! keys use a double underscore: `REPLOG_COORDINATOR__QUORUM_SIZE=1`.
//! Binaries apply their command-line flags on top. Nothing is reloaded at
//! runtime.

use crate::common::{normalize_url, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "REPLOG_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "replog.toml";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node ID (unique identifier)
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Coordinator-specific config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator: Option<CoordinatorConfig>,

    /// Replica-specific config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica: Option<ReplicaConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_node_id() -> String {
    "node-1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            coordinator: None,
            replica: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from `REPLOG_CONFIG` (or `replog.toml`) plus the environment.
    /// A missing file is not an error.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("REPLOG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("coordinator.replicas")
                    .with_list_parse_key("replica.delay_ms"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Bind address for HTTP API
    pub bind_addr: SocketAddr,

    /// Base URLs of every replica, fixed for the process lifetime
    pub replicas: Vec<String>,

    /// Minimum number of Healthy replicas needed to accept writes
    pub quorum_size: usize,

    /// Heartbeat sweep period
    pub heartbeat_interval_ms: u64,

    /// Upper bound for a single heartbeat probe
    pub heartbeat_timeout_ms: u64,

    /// Delivery attempts per replica and entry
    pub max_retries: u32,

    /// Exponential backoff base
    pub backoff_base: u32,

    /// One backoff "time unit"
    pub backoff_unit_ms: u64,

    /// Upper bound for a single replicate call
    pub replicate_timeout_ms: u64,

    /// Optional bound on how long a write waits for its acknowledgments.
    /// `None` waits until the write concern is met or every delivery gave up.
    pub write_timeout_ms: Option<u64>,

    /// Request body limit for the public API
    pub max_body_bytes: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            replicas: vec![
                "http://127.0.0.1:5001".to_string(),
                "http://127.0.0.1:5002".to_string(),
            ],
            quorum_size: 2,
            heartbeat_interval_ms: 10_000,
            heartbeat_timeout_ms: 3_000,
            max_retries: 7,
            backoff_base: 3,
            backoff_unit_ms: 1_000,
            replicate_timeout_ms: 5_000,
            write_timeout_ms: None,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.replicas.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "at least one replica URL is required".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(crate::Error::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        if self.backoff_base == 0 {
            return Err(crate::Error::InvalidConfig(
                "backoff_base must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("heartbeat_timeout_ms", self.heartbeat_timeout_ms),
            ("replicate_timeout_ms", self.replicate_timeout_ms),
        ] {
            if value == 0 {
                return Err(crate::Error::InvalidConfig(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        let mut seen = HashSet::new();
        for url in &self.replicas {
            if !seen.insert(normalize_url(url)) {
                return Err(crate::Error::InvalidConfig(format!(
                    "duplicate replica URL: {}",
                    url
                )));
            }
        }

        if self.quorum_size > self.replicas.len() {
            tracing::warn!(
                quorum = self.quorum_size,
                replicas = self.replicas.len(),
                "quorum_size exceeds replica count; coordinator will stay read-only"
            );
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn replicate_timeout(&self) -> Duration {
        Duration::from_millis(self.replicate_timeout_ms)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_ms.map(Duration::from_millis)
    }
}

/// Replica configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    /// Bind address for HTTP API
    pub bind_addr: SocketAddr,

    /// Simulated propagation delays; one is drawn per accepted entry
    pub delay_ms: Vec<u64>,

    /// Probability of answering a replicate call with a simulated failure
    pub drop_chance: f64,

    /// Request body limit
    pub max_body_bytes: usize,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5001)),
            delay_ms: vec![100, 250, 500, 1000],
            drop_chance: 0.0,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ReplicaConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.drop_chance) {
            return Err(crate::Error::InvalidConfig(format!(
                "drop_chance must be within [0, 1], got {}",
                self.drop_chance
            )));
        }
        Ok(())
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delay_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}
