//! Typed HTTP client for the coordinator and replica APIs

use crate::common::{normalize_url, Entry, Error, MessagesResponse, ReplicaHealth, Result};
use crate::coordinator::http::{WriteRequest, WriteResponse};
use crate::coordinator::QuorumState;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ClusterClient {
    http: reqwest::Client,
    coordinator: String,
}

impl ClusterClient {
    pub fn new(coordinator: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            coordinator: normalize_url(coordinator),
        }
    }

    /// Submit a write with write concern `w`
    pub async fn write(&self, message: &str, w: u32) -> Result<Entry> {
        let response = self
            .http
            .post(format!("{}/messages", self.coordinator))
            .json(&WriteRequest {
                message: Some(message.to_string()),
                w,
            })
            .send()
            .await?;
        let body: WriteResponse = decode(response).await?;
        Ok(body.entry)
    }

    /// The coordinator's full log
    pub async fn read(&self) -> Result<Vec<Entry>> {
        self.messages(&self.coordinator).await
    }

    /// A replica's gap-free view
    pub async fn replica_read(&self, replica: &str) -> Result<Vec<Entry>> {
        self.messages(&normalize_url(replica)).await
    }

    pub async fn health(&self) -> Result<BTreeMap<String, ReplicaHealth>> {
        let response = self
            .http
            .get(format!("{}/health", self.coordinator))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn quorum(&self) -> Result<QuorumState> {
        let response = self
            .http
            .get(format!("{}/quorum", self.coordinator))
            .send()
            .await?;
        decode(response).await
    }

    async fn messages(&self, base: &str) -> Result<Vec<Entry>> {
        let response = self.http.get(format!("{}/messages", base)).send().await?;
        let body: MessagesResponse = decode(response).await?;
        Ok(body.messages)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    Err(Error::Http(format!("{}: {}", status.as_u16(), message)))
}
