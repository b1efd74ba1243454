//! Delivery of entries from the coordinator to one replica
//!
//! Replicate calls are idempotent on the replica side (dedup by id), so a
//! failed or timed out attempt is simply sent again. The delay before
//! attempt `k + 1` is `base^k` units; there is no jitter and no sleep after
//! the final attempt.

use crate::common::{backoff_delay, CoordinatorConfig, Entry, Error, ReplicateRequest, Result};
use crate::coordinator::ack::AckTracker;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: u32,
    pub unit: Duration,
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        backoff_delay(self.base, attempt, self.unit)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 7,
            base: 3,
            unit: Duration::from_secs(1),
        }
    }
}

impl From<&CoordinatorConfig> for RetryPolicy {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base: config.backoff_base,
            unit: config.backoff_unit(),
        }
    }
}

/// Cheap to clone; every fan-out task owns one.
#[derive(Debug, Clone)]
pub struct ReplicationClient {
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl ReplicationClient {
    pub fn new(policy: RetryPolicy, attempt_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(attempt_timeout).build()?;
        Ok(Self { http, policy })
    }

    pub fn from_config(config: &CoordinatorConfig) -> Result<Self> {
        Self::new(RetryPolicy::from(config), config.replicate_timeout())
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// One replicate call, no retries.
    pub async fn replicate_once(&self, replica: &str, entry: &Entry) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/replicate", replica))
            .json(&ReplicateRequest::from(entry))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::ReplicaStatus {
                replica: replica.to_string(),
                status: status.as_u16(),
            })
        }
    }

    /// Deliver `entry` to `replica`, retrying with backoff.
    ///
    /// Reports exactly once into `tracker`: an ack on success, a give-up once
    /// the retry budget is spent or the replica rejects the entry outright.
    /// Returns whether the replica acknowledged.
    pub async fn deliver(&self, replica: &str, entry: &Entry, tracker: &AckTracker) -> bool {
        for attempt in 0..self.policy.max_retries {
            match self.replicate_once(replica, entry).await {
                Ok(()) => {
                    let fired = tracker.record_ack().await;
                    tracing::info!(
                        replica,
                        entry_id = entry.id,
                        attempt = attempt + 1,
                        threshold_reached = fired,
                        "Replication successful"
                    );
                    return true;
                }
                Err(e) if !e.is_retryable() => {
                    tracing::error!(
                        replica,
                        entry_id = entry.id,
                        attempt = attempt + 1,
                        error = %e,
                        "Replica rejected entry, not retrying"
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        replica,
                        entry_id = entry.id,
                        attempt = attempt + 1,
                        error = %e,
                        "Replication attempt failed"
                    );
                    if attempt + 1 < self.policy.max_retries {
                        tokio::time::sleep(self.policy.delay(attempt)).await;
                    }
                }
            }
        }

        tracker.record_give_up().await;
        tracing::error!(replica, entry_id = entry.id, "Replication gave up");
        false
    }
}
