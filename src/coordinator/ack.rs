//! Per-write acknowledgment counting
//!
//! An [`AckTracker`] lives for one write. Delivery tasks report into it and
//! the request path waits on it. The threshold signal is a oneshot channel:
//! the sender is taken out of the shared state under the same lock that
//! bumps the counter, so only one reporter can ever fire it.

use crate::common::{Error, Result};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

/// How the wait on a tracker ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// `required` acknowledgments were observed
    Reached { acks: u32 },
    /// Every dispatched delivery finished without reaching `required`
    Exhausted { acks: u32 },
}

#[derive(Debug)]
struct AckState {
    count: u32,
    pending: usize,
    signal: Option<oneshot::Sender<AckOutcome>>,
}

impl AckState {
    fn fire(&mut self, outcome: AckOutcome) -> bool {
        match self.signal.take() {
            Some(tx) => {
                // The waiter may already be gone (w <= 1 or a timed out request)
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    fn settle(&mut self, required: u32) -> bool {
        if self.count >= required {
            self.fire(AckOutcome::Reached { acks: self.count })
        } else if self.pending == 0 {
            self.fire(AckOutcome::Exhausted { acks: self.count })
        } else {
            false
        }
    }
}

#[derive(Debug)]
pub struct AckTracker {
    required: u32,
    state: Mutex<AckState>,
    waiter: Mutex<Option<oneshot::Receiver<AckOutcome>>>,
}

impl AckTracker {
    /// Tracker for a write needing `required` acks, fanned out to
    /// `deliveries` replicas. The coordinator's own ack is counted up front.
    pub fn new(required: u32, deliveries: usize) -> Self {
        let (tx, rx) = oneshot::channel();
        let mut state = AckState {
            count: 1,
            pending: deliveries,
            signal: Some(tx),
        };
        state.settle(required);

        Self {
            required,
            state: Mutex::new(state),
            waiter: Mutex::new(Some(rx)),
        }
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    /// Current acknowledgment count, the coordinator included
    pub async fn acks(&self) -> u32 {
        self.state.lock().await.count
    }

    /// Count one successful delivery. Returns true if this call fired the signal.
    pub async fn record_ack(&self) -> bool {
        let mut state = self.state.lock().await;
        state.count += 1;
        state.pending = state.pending.saturating_sub(1);
        state.settle(self.required)
    }

    /// A delivery gave up after exhausting its retries.
    pub async fn record_give_up(&self) -> bool {
        let mut state = self.state.lock().await;
        state.pending = state.pending.saturating_sub(1);
        state.settle(self.required)
    }

    /// Wait until the threshold is reached or every delivery has finished.
    ///
    /// Returns immediately when `required <= 1`. Only one caller may wait;
    /// a second call is an error.
    pub async fn wait_for_threshold(&self) -> Result<AckOutcome> {
        if self.required <= 1 {
            return Ok(AckOutcome::Reached {
                acks: self.acks().await,
            });
        }

        let rx = self
            .waiter
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::Internal("ack tracker already awaited".into()))?;

        rx.await
            .map_err(|_| Error::Internal("ack tracker dropped before signalling".into()))
    }

    /// [`wait_for_threshold`](Self::wait_for_threshold) bounded by `timeout`.
    pub async fn wait_for_threshold_timeout(&self, timeout: Duration) -> Result<AckOutcome> {
        tokio::time::timeout(timeout, self.wait_for_threshold())
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "write concern {} not met within {:?}",
                    self.required, timeout
                ))
            })?
    }
}
