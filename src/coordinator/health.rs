//! Replica liveness tracking and quorum fencing
//!
//! A background task probes every replica's `/heartbeat` on a fixed period.
//! Each sweep fully overwrites the previous classification (no debounce):
//! a success status means Healthy, any other status Suspected, and a
//! timeout or connection failure Unhealthy. After every sweep the
//! coordinator's write mode is recomputed; it is read-only whenever fewer
//! than `quorum_size` replicas are Healthy.

use crate::common::{normalize_url, CoordinatorConfig, Error, ReplicaHealth, Result};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    Write,
    ReadOnly,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Write => write!(f, "Write"),
            WriteMode::ReadOnly => write!(f, "ReadOnly"),
        }
    }
}

/// Snapshot of the quorum state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumState {
    pub quorum_met: bool,
    pub mode: WriteMode,
    pub healthy: usize,
    pub quorum_size: usize,
}

impl QuorumState {
    fn new(healthy: usize, quorum_size: usize, read_only: bool) -> Self {
        Self {
            quorum_met: !read_only,
            mode: if read_only {
                WriteMode::ReadOnly
            } else {
                WriteMode::Write
            },
            healthy,
            quorum_size,
        }
    }
}

pub struct HealthMonitor {
    health: RwLock<BTreeMap<String, ReplicaHealth>>,
    read_only: AtomicBool,
    quorum_size: usize,
    interval: Duration,
    http: reqwest::Client,
}

impl HealthMonitor {
    /// Every replica starts out Healthy.
    pub fn new(
        replicas: &[String],
        quorum_size: usize,
        interval: Duration,
        probe_timeout: Duration,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::InvalidConfig(
                "heartbeat interval must be non-zero".into(),
            ));
        }
        let health: BTreeMap<String, ReplicaHealth> = replicas
            .iter()
            .map(|url| (normalize_url(url), ReplicaHealth::Healthy))
            .collect();
        let read_only = health.len() < quorum_size;
        let http = reqwest::Client::builder().timeout(probe_timeout).build()?;

        Ok(Self {
            health: RwLock::new(health),
            read_only: AtomicBool::new(read_only),
            quorum_size,
            interval,
            http,
        })
    }

    pub fn from_config(config: &CoordinatorConfig) -> Result<Self> {
        Self::new(
            &config.replicas,
            config.quorum_size,
            config.heartbeat_interval(),
            config.heartbeat_timeout(),
        )
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }

    pub fn quorum_size(&self) -> usize {
        self.quorum_size
    }

    /// Current classification of every replica
    pub async fn health(&self) -> BTreeMap<String, ReplicaHealth> {
        self.health.read().await.clone()
    }

    /// Replicas eligible for new writes
    pub async fn healthy_replicas(&self) -> Vec<String> {
        self.health
            .read()
            .await
            .iter()
            .filter(|(_, h)| h.is_healthy())
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub async fn quorum(&self) -> QuorumState {
        let health = self.health.read().await;
        let healthy = health.values().filter(|h| h.is_healthy()).count();
        let read_only = self.is_read_only();
        QuorumState::new(healthy, self.quorum_size, read_only)
    }

    /// Probe one replica
    pub async fn probe(&self, replica: &str) -> ReplicaHealth {
        match self.http.get(format!("{}/heartbeat", replica)).send().await {
            Ok(response) if response.status().is_success() => ReplicaHealth::Healthy,
            Ok(response) => {
                tracing::warn!(
                    replica,
                    status = response.status().as_u16(),
                    "Heartbeat answered with non-success status"
                );
                ReplicaHealth::Suspected
            }
            Err(e) => {
                tracing::warn!(replica, error = %e, "Heartbeat failed");
                ReplicaHealth::Unhealthy
            }
        }
    }

    /// Probe every replica concurrently, then apply the results in one step.
    pub async fn sweep(&self) -> QuorumState {
        let replicas: Vec<String> = self.health.read().await.keys().cloned().collect();
        let outcomes = join_all(replicas.iter().map(|url| self.probe(url))).await;
        self.apply(replicas.into_iter().zip(outcomes)).await
    }

    /// Overwrite classifications and recompute the write mode under one lock.
    /// Unknown replicas are ignored; the replica set is fixed at startup.
    pub async fn apply(
        &self,
        results: impl IntoIterator<Item = (String, ReplicaHealth)>,
    ) -> QuorumState {
        let mut health = self.health.write().await;
        for (url, status) in results {
            let url = normalize_url(&url);
            match health.get_mut(&url) {
                Some(current) => {
                    let previous = *current;
                    *current = status;
                    if previous != status {
                        tracing::info!(
                            replica = %url,
                            from = %previous,
                            to = %status,
                            "Replica health changed"
                        );
                    }
                }
                None => {
                    tracing::warn!(replica = %url, "Ignoring health report for unknown replica")
                }
            }
        }

        let healthy = health.values().filter(|h| h.is_healthy()).count();
        let read_only = healthy < self.quorum_size;
        let was_read_only = self.read_only.swap(read_only, Ordering::AcqRel);

        if read_only && !was_read_only {
            tracing::warn!(
                healthy,
                quorum = self.quorum_size,
                "Quorum not met, switching to read-only mode"
            );
        } else if !read_only && was_read_only {
            tracing::info!(
                healthy,
                quorum = self.quorum_size,
                "Quorum restored, back in write mode"
            );
        }

        QuorumState::new(healthy, self.quorum_size, read_only)
    }

    /// Hold the classification lock the way a sweep's `apply` does
    #[cfg(test)]
    pub(crate) async fn lock_health_for_test(
        &self,
    ) -> tokio::sync::RwLockWriteGuard<'_, BTreeMap<String, ReplicaHealth>> {
        self.health.write().await
    }

    /// Sweep forever on the configured period. The first sweep runs at once.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let state = self.sweep().await;
            tracing::debug!(
                healthy = state.healthy,
                quorum = state.quorum_size,
                mode = %state.mode,
                "Heartbeat sweep complete"
            );
        }
    }
}

/// Start the heartbeat loop in the background
pub fn start_health_monitor(monitor: Arc<HealthMonitor>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(monitor.run())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(replicas: &[&str], quorum: usize) -> HealthMonitor {
        let replicas: Vec<String> = replicas.iter().map(|s| s.to_string()).collect();
        HealthMonitor::new(
            &replicas,
            quorum,
            Duration::from_secs(10),
            Duration::from_millis(200),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_initial_state_is_healthy() {
        let m = monitor(&["http://r1:5001", "http://r2:5002/"], 2);
        assert!(!m.is_read_only());
        assert_eq!(m.healthy_replicas().await.len(), 2);
        assert!(m.health().await.contains_key("http://r2:5002"));

        let q = m.quorum().await;
        assert!(q.quorum_met);
        assert_eq!(q.mode, WriteMode::Write);
    }

    #[tokio::test]
    async fn test_quorum_larger_than_cluster_starts_read_only() {
        let m = monitor(&["http://r1:5001"], 2);
        assert!(m.is_read_only());
    }

    #[tokio::test]
    async fn test_read_only_iff_healthy_below_quorum() {
        let m = monitor(&["http://r1:5001", "http://r2:5002", "http://r3:5003"], 2);

        let q = m
            .apply([("http://r1:5001".to_string(), ReplicaHealth::Suspected)])
            .await;
        assert_eq!(q.healthy, 2);
        assert!(q.quorum_met);
        assert!(!m.is_read_only());

        let q = m
            .apply([("http://r2:5002".to_string(), ReplicaHealth::Unhealthy)])
            .await;
        assert_eq!(q.healthy, 1);
        assert_eq!(q.mode, WriteMode::ReadOnly);
        assert!(m.is_read_only());
        assert_eq!(m.healthy_replicas().await, vec!["http://r3:5003".to_string()]);

        // One good probe is enough to recover
        m.apply([("http://r1:5001".to_string(), ReplicaHealth::Healthy)])
            .await;
        assert!(!m.is_read_only());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let replicas = vec!["http://r1:5001".to_string()];
        let err = HealthMonitor::new(&replicas, 1, Duration::ZERO, Duration::from_millis(200))
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_unknown_replica_ignored() {
        let m = monitor(&["http://r1:5001"], 1);
        m.apply([("http://elsewhere:1".to_string(), ReplicaHealth::Unhealthy)])
            .await;
        assert_eq!(m.health().await.len(), 1);
        assert!(!m.is_read_only());
    }

    #[tokio::test]
    async fn test_sweep_marks_unreachable_unhealthy() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let m = monitor(&[url.as_str()], 1);
        let q = m.sweep().await;
        assert_eq!(m.health().await[&url], ReplicaHealth::Unhealthy);
        assert!(!q.quorum_met);
    }
}
