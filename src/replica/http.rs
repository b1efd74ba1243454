//! HTTP API for a replica
//!
//! - `POST /replicate`: called by the coordinator only
//! - `GET /messages`: gap-free prefix of the replicated log
//! - `GET /heartbeat`: liveness probe

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{Error, MessagesResponse, ReplicateRequest};
use crate::replica::store::{IngestOutcome, ReplicaStore};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

#[derive(Clone)]
pub struct ReplicaState {
    pub store: Arc<ReplicaStore>,
    pub replica_id: String,
    /// Probability of failing a replicate call on purpose
    pub drop_chance: f64,
}

pub fn create_router(state: ReplicaState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/replicate", post(replicate))
        .route("/messages", get(get_messages))
        .route("/heartbeat", get(heartbeat))
        .layer(middleware::from_fn(request_tracing_middleware))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn replicate(
    State(state): State<ReplicaState>,
    body: Result<Json<ReplicateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    if state.drop_chance > 0.0 && rand::random::<f64>() < state.drop_chance {
        tracing::error!(
            replica = %state.replica_id,
            "Simulated network failure: replicate call dropped"
        );
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "POST request failed (simulated)" })),
        ));
    }

    let Json(req) = body.map_err(|e| Error::InvalidRequest(e.body_text()))?;

    match state.store.ingest(req).await {
        IngestOutcome::Accepted => Ok((
            StatusCode::OK,
            Json(json!({ "status": "Message replicated" })),
        )),
        IngestOutcome::DuplicateIgnored => Ok((
            StatusCode::OK,
            Json(json!({ "status": "Duplicate message ignored" })),
        )),
        IngestOutcome::Rejected(reason) => Err(Error::InvalidRequest(reason)),
    }
}

async fn get_messages(State(state): State<ReplicaState>) -> impl IntoResponse {
    Json(MessagesResponse {
        messages: state.store.read_view().await,
    })
}

async fn heartbeat(State(state): State<ReplicaState>) -> impl IntoResponse {
    tracing::debug!(replica = %state.replica_id, "Heartbeat received");
    Json(json!({ "status": "Healthy" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Entry;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(drop_chance: f64) -> Router {
        create_router(
            ReplicaState {
                store: Arc::new(ReplicaStore::new()),
                replica_id: "replica-test".to_string(),
                drop_chance,
            },
            1024,
        )
    }

    fn replicate_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/replicate")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_replicate_and_duplicate() {
        let app = app(0.0);
        let body = serde_json::to_string(&Entry::new(1, "A")).unwrap();

        let response = app
            .clone()
            .oneshot(replicate_request(body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "Message replicated");

        let response = app.clone().oneshot(replicate_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["status"],
            "Duplicate message ignored"
        );

        let response = app
            .oneshot(Request::builder().uri("/messages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["messages"][0]["id"], 1);
    }

    #[tokio::test]
    async fn test_malformed_replicate_is_bad_request() {
        let app = app(0.0);
        let response = app
            .clone()
            .oneshot(replicate_request(r#"{"id": 1}"#.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(replicate_request("{".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_drop_chance_one_always_fails() {
        let app = app(1.0);
        let body = serde_json::to_string(&Entry::new(1, "A")).unwrap();
        let response = app.oneshot(replicate_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_heartbeat() {
        let response = app(0.0)
            .oneshot(Request::builder().uri("/heartbeat").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "Healthy");
    }
}
