//! Write orchestration
//!
//! A write is appended to the local log, then fanned out to every replica
//! currently classified Healthy. The caller gets an answer once the write
//! concern `w` is met (the coordinator's own copy counts as one ack). The
//! fan-out tasks are detached: they belong to the runtime, not to the
//! request, and keep retrying after the response has been sent.

use crate::common::{CoordinatorConfig, Entry, Error, ReplicaHealth, Result};
use crate::coordinator::ack::{AckOutcome, AckTracker};
use crate::coordinator::health::{HealthMonitor, QuorumState};
use crate::coordinator::replication::ReplicationClient;
use crate::coordinator::write_log::WriteLog;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub struct Coordinator {
    log: WriteLog,
    monitor: Arc<HealthMonitor>,
    client: ReplicationClient,
    write_timeout: Option<Duration>,
}

impl Coordinator {
    pub fn new(
        monitor: Arc<HealthMonitor>,
        client: ReplicationClient,
        write_timeout: Option<Duration>,
    ) -> Self {
        Self {
            log: WriteLog::new(),
            monitor,
            client,
            write_timeout,
        }
    }

    pub fn from_config(config: &CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        let monitor = Arc::new(HealthMonitor::from_config(config)?);
        let client = ReplicationClient::from_config(config)?;
        Ok(Self::new(monitor, client, config.write_timeout()))
    }

    pub fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }

    /// Accept a write and replicate it with write concern `w`.
    ///
    /// `w <= 1` returns as soon as the entry is in the local log. Otherwise
    /// this waits for `w - 1` replica acks, or fails with
    /// [`Error::ReplicationFailed`] once every dispatched delivery has
    /// finished without getting there. The entry stays in the log either way.
    pub async fn submit_write(&self, payload: &str, w: u32) -> Result<Entry> {
        if self.monitor.is_read_only() {
            let quorum = self.monitor.quorum().await;
            tracing::warn!(
                healthy = quorum.healthy,
                quorum = quorum.quorum_size,
                "Rejecting write in read-only mode"
            );
            return Err(Error::ReadOnly {
                healthy: quorum.healthy,
                quorum: quorum.quorum_size,
            });
        }

        if payload.is_empty() {
            return Err(Error::InvalidRequest("message is required".into()));
        }

        let required = w.max(1);
        let targets = self.monitor.healthy_replicas().await;
        // Nothing may await between the append and the spawns below: a request
        // dropped in between would leave an id that no replica ever receives.
        let entry = self.log.append(payload).await;
        tracing::info!(
            entry_id = entry.id,
            write_concern = required,
            targets = targets.len(),
            "Accepted write"
        );

        let tracker = Arc::new(AckTracker::new(required, targets.len()));
        for replica in targets {
            let client = self.client.clone();
            let entry = entry.clone();
            let tracker = tracker.clone();
            tokio::spawn(async move {
                client.deliver(&replica, &entry, &tracker).await;
            });
        }

        if required <= 1 {
            tracing::debug!(
                entry_id = entry.id,
                "Returning with w=1, replication continues in background"
            );
            return Ok(entry);
        }

        let outcome = match self.write_timeout {
            Some(timeout) => tracker.wait_for_threshold_timeout(timeout).await?,
            None => tracker.wait_for_threshold().await?,
        };

        match outcome {
            AckOutcome::Reached { acks } => {
                tracing::info!(entry_id = entry.id, acks, required, "Write concern met");
                Ok(entry)
            }
            AckOutcome::Exhausted { acks } => {
                tracing::error!(
                    entry_id = entry.id,
                    acks,
                    required,
                    "Write concern not met, every delivery finished"
                );
                Err(Error::ReplicationFailed { acks, required })
            }
        }
    }

    /// The full log in id order
    pub async fn get_messages(&self) -> Vec<Entry> {
        self.log.snapshot().await
    }

    pub async fn get_health(&self) -> BTreeMap<String, ReplicaHealth> {
        self.monitor.health().await
    }

    pub async fn get_quorum(&self) -> QuorumState {
        self.monitor.quorum().await
    }
}
