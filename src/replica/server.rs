//! Replica server

use crate::common::{ReplicaConfig, Result};
use crate::replica::http::{create_router, ReplicaState};
use crate::replica::store::ReplicaStore;
use std::sync::Arc;

pub struct ReplicaServer {
    config: ReplicaConfig,
    replica_id: String,
}

impl ReplicaServer {
    pub fn new(config: ReplicaConfig, replica_id: String) -> Self {
        Self { config, replica_id }
    }

    pub async fn serve(self) -> Result<()> {
        self.config.validate()?;

        tracing::info!("Starting replica: {}", self.replica_id);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Simulated delays (ms): {:?}", self.config.delay_ms);
        tracing::info!("  Drop chance: {}", self.config.drop_chance);

        let store = Arc::new(ReplicaStore::with_delays(self.config.delays()));

        let http_router = create_router(
            ReplicaState {
                store,
                replica_id: self.replica_id.clone(),
                drop_chance: self.config.drop_chance,
            },
            self.config.max_body_bytes,
        );

        let http_listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        let http_server = axum::serve(http_listener, http_router);

        tracing::info!("✓ Replica ready");

        tokio::select! {
            res = http_server => {
                if let Err(e) = res {
                    tracing::error!("HTTP server error: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
        }

        Ok(())
    }
}
