//! Shared helpers: in-process replicas on ephemeral ports and a fast-retry coordinator
#![allow(dead_code)]

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use replog::common::ReplicateRequest;
use replog::coordinator::{Coordinator, HealthMonitor, ReplicationClient, RetryPolicy};
use replog::replica::http::{create_router, ReplicaState};
use replog::replica::{IngestOutcome, ReplicaStore};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct TestReplica {
    pub url: String,
    pub store: Arc<ReplicaStore>,
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A real replica router with the given simulated delays
pub async fn spawn_replica(delays_ms: &[u64]) -> TestReplica {
    let store = Arc::new(ReplicaStore::with_delays(
        delays_ms.iter().copied().map(Duration::from_millis).collect(),
    ));
    let router = create_router(
        ReplicaState {
            store: store.clone(),
            replica_id: "test-replica".to_string(),
            drop_chance: 0.0,
        },
        1024 * 1024,
    );
    let url = serve(router).await;
    TestReplica { url, store }
}

/// An address nothing listens on
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[derive(Clone)]
pub struct FlakyState {
    pub store: Arc<ReplicaStore>,
    /// Heartbeat answers 200 while true, 503 otherwise
    pub up: Arc<AtomicBool>,
    /// Replicate calls still to fail with 500
    pub fail_next: Arc<AtomicUsize>,
    pub attempts: Arc<AtomicUsize>,
}

pub struct FlakyReplica {
    pub url: String,
    pub state: FlakyState,
}

async fn flaky_replicate(
    State(state): State<FlakyState>,
    Json(req): Json<ReplicateRequest>,
) -> StatusCode {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    let failing = state
        .fail_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    match state.store.ingest(req).await {
        IngestOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    }
}

async fn flaky_heartbeat(State(state): State<FlakyState>) -> StatusCode {
    if state.up.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// A replica whose heartbeat and replicate behaviour can be steered
pub async fn spawn_flaky_replica(fail_first: usize) -> FlakyReplica {
    let state = FlakyState {
        store: Arc::new(ReplicaStore::new()),
        up: Arc::new(AtomicBool::new(true)),
        fail_next: Arc::new(AtomicUsize::new(fail_first)),
        attempts: Arc::new(AtomicUsize::new(0)),
    };
    let router = Router::new()
        .route("/replicate", post(flaky_replicate))
        .route("/heartbeat", get(flaky_heartbeat))
        .with_state(state.clone());
    let url = serve(router).await;
    FlakyReplica { url, state }
}

/// Coordinator with millisecond backoff so retry exhaustion is quick
pub fn coordinator(replicas: &[String], quorum: usize, max_retries: u32) -> Arc<Coordinator> {
    let monitor = Arc::new(
        HealthMonitor::new(
            replicas,
            quorum,
            Duration::from_millis(50),
            Duration::from_millis(500),
        )
        .unwrap(),
    );
    let client = ReplicationClient::new(
        RetryPolicy {
            max_retries,
            base: 3,
            unit: Duration::from_millis(2),
        },
        Duration::from_secs(2),
    )
    .unwrap();
    Arc::new(Coordinator::new(monitor, client, None))
}

/// Poll `check` until it returns true or `timeout` elapses
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
