//! Coordinator-side append-only log
//!
//! Id assignment and append happen under one lock, so ids are handed out
//! 1, 2, 3, ... with no gaps or repeats regardless of how many requests race.

use crate::common::Entry;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct WriteLog {
    entries: Mutex<Vec<Entry>>,
}

impl WriteLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next id and append. Visible to every later `snapshot`.
    pub async fn append(&self, payload: impl Into<String>) -> Entry {
        let mut entries = self.entries.lock().await;
        let id = entries.last().map_or(1, |last| last.id + 1);
        let entry = Entry::new(id, payload);
        entries.push(entry.clone());
        entry
    }

    /// All entries in id order
    pub async fn snapshot(&self) -> Vec<Entry> {
        let mut entries = self.entries.lock().await.clone();
        entries.sort_by_key(|e| e.id);
        entries
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
