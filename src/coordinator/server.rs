//! Coordinator server

use crate::common::{CoordinatorConfig, Result};
use crate::coordinator::core::Coordinator;
use crate::coordinator::health::start_health_monitor;
use crate::coordinator::http::{create_router, CoordState};
use std::sync::Arc;

pub struct CoordinatorServer {
    config: CoordinatorConfig,
    node_id: String,
}

impl CoordinatorServer {
    pub fn new(config: CoordinatorConfig, node_id: String) -> Self {
        Self { config, node_id }
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting coordinator: {}", self.node_id);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Replicas: {}", self.config.replicas.join(", "));
        tracing::info!("  Quorum size: {}", self.config.quorum_size);
        tracing::info!(
            "  Heartbeat: every {:?}, timeout {:?}",
            self.config.heartbeat_interval(),
            self.config.heartbeat_timeout()
        );

        let coordinator = Arc::new(Coordinator::from_config(&self.config)?);

        // Heartbeats run for the whole process lifetime
        let monitor_handle = start_health_monitor(coordinator.monitor().clone());

        let http_router = create_router(
            CoordState {
                coordinator: coordinator.clone(),
            },
            self.config.max_body_bytes,
        );

        let http_listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        let http_server = axum::serve(http_listener, http_router);

        tracing::info!("✓ Coordinator ready");

        tokio::select! {
            res = http_server => {
                if let Err(e) = res {
                    tracing::error!("HTTP server error: {}", e);
                }
            }
            res = monitor_handle => {
                if let Err(e) = res {
                    tracing::error!("Health monitor stopped: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
        }

        Ok(())
    }
}
