//! Replica-side entry store
//!
//! Entries arrive from the coordinator in any order and possibly more than
//! once. Duplicates are ignored by id. Readers only ever see the longest
//! run `1..=k` with no holes, so an entry whose predecessor is still in
//! flight stays hidden until the gap closes.

use crate::common::{Entry, ReplicateRequest};
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted,
    DuplicateIgnored,
    /// Missing id, message or timestamp. A coordinator bug, never retried.
    Rejected(String),
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: BTreeMap<u64, Entry>,
    seen: HashSet<u64>,
}

#[derive(Debug, Default)]
pub struct ReplicaStore {
    inner: Mutex<StoreInner>,
    delays: Vec<Duration>,
}

impl ReplicaStore {
    /// Store without simulated latency
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that waits a randomly chosen delay before keeping each new entry
    pub fn with_delays(delays: Vec<Duration>) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            delays,
        }
    }

    fn pick_delay(&self) -> Duration {
        self.delays
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default()
    }

    pub async fn ingest(&self, req: ReplicateRequest) -> IngestOutcome {
        let entry = match Entry::try_from(req) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid data provided for replication");
                return IngestOutcome::Rejected(e.to_string());
            }
        };

        // Cheap early exit so retried duplicates skip the simulated delay
        if self.inner.lock().await.seen.contains(&entry.id) {
            tracing::info!(entry_id = entry.id, "Duplicate message ignored");
            return IngestOutcome::DuplicateIgnored;
        }

        let delay = self.pick_delay();
        if !delay.is_zero() {
            tracing::debug!(
                entry_id = entry.id,
                delay_ms = delay.as_millis() as u64,
                "Simulating propagation delay"
            );
            tokio::time::sleep(delay).await;
        }

        // Authoritative check and insert under one lock
        let mut inner = self.inner.lock().await;
        if !inner.seen.insert(entry.id) {
            tracing::info!(entry_id = entry.id, "Duplicate message ignored");
            return IngestOutcome::DuplicateIgnored;
        }
        tracing::info!(entry_id = entry.id, "Message replicated");
        inner.entries.insert(entry.id, entry);
        IngestOutcome::Accepted
    }

    /// Entries `1..=k` for the largest `k` with no missing id
    pub async fn read_view(&self) -> Vec<Entry> {
        let inner = self.inner.lock().await;
        inner
            .entries
            .values()
            .zip(1u64..)
            .take_while(|(entry, expected)| entry.id == *expected)
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    /// Every stored entry, gaps included
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn req(id: u64, message: &str) -> ReplicateRequest {
        ReplicateRequest::from(&Entry::new(id, message))
    }

    #[tokio::test]
    async fn test_duplicate_ingest_stores_once() {
        let store = ReplicaStore::new();
        assert_eq!(store.ingest(req(1, "A")).await, IngestOutcome::Accepted);
        assert_eq!(
            store.ingest(req(1, "A")).await,
            IngestOutcome::DuplicateIgnored
        );
        assert_eq!(store.len().await, 1);
        assert_eq!(store.read_view().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reordered_delivery_is_held_back() {
        let store = ReplicaStore::new();
        store.ingest(req(2, "B")).await;
        assert!(store.read_view().await.is_empty());
        assert_eq!(store.len().await, 1);

        store.ingest(req(1, "A")).await;
        let ids: Vec<u64> = store.read_view().await.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_view_stops_at_first_gap() {
        let store = ReplicaStore::new();
        for id in [1, 2, 4, 5] {
            store.ingest(req(id, "x")).await;
        }
        let ids: Vec<u64> = store.read_view().await.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);

        store.ingest(req(3, "x")).await;
        let ids: Vec<u64> = store.read_view().await.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_malformed_entries_rejected() {
        let store = ReplicaStore::new();
        let outcome = store
            .ingest(ReplicateRequest {
                id: Some(1),
                message: None,
                timestamp: Some(chrono::Utc::now()),
            })
            .await;
        assert!(matches!(outcome, IngestOutcome::Rejected(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_store_once() {
        let store = Arc::new(ReplicaStore::with_delays(vec![
            Duration::from_millis(1),
            Duration::from_millis(5),
        ]));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.ingest(req(1, "A")).await }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() == IngestOutcome::Accepted {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.len().await, 1);
    }
}
