//! HTTP API for the coordinator
//!
//! - `POST /messages` `{"message": "...", "w": 2}`: append and replicate
//! - `GET /messages`: the full log
//! - `GET /health`: replica classifications
//! - `GET /quorum`: write mode

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{Entry, Error, MessagesResponse};
use crate::coordinator::core::Coordinator;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Shared coordinator state for HTTP handlers.
#[derive(Clone)]
pub struct CoordState {
    pub coordinator: Arc<Coordinator>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Write concern, the coordinator included
    #[serde(default = "default_w")]
    pub w: u32,
}

fn default_w() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse {
    pub status: String,
    pub entry: Entry,
}

/// Creates the HTTP router with all public endpoints.
pub fn create_router(state: CoordState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/messages", get(get_messages).post(post_message))
        .route("/health", get(health))
        .route("/quorum", get(quorum))
        .layer(middleware::from_fn(request_tracing_middleware))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn post_message(
    State(state): State<CoordState>,
    body: Result<Json<WriteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(req) = body.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    let message = req.message.unwrap_or_default();

    let entry = state.coordinator.submit_write(&message, req.w).await?;

    Ok((
        StatusCode::CREATED,
        Json(WriteResponse {
            status: "Message replicated".to_string(),
            entry,
        }),
    ))
}

async fn get_messages(State(state): State<CoordState>) -> impl IntoResponse {
    Json(MessagesResponse {
        messages: state.coordinator.get_messages().await,
    })
}

async fn health(State(state): State<CoordState>) -> impl IntoResponse {
    Json(state.coordinator.get_health().await)
}

async fn quorum(State(state): State<CoordState>) -> impl IntoResponse {
    Json(state.coordinator.get_quorum().await)
}
