//! Ringlb worker library
//!
//! A sample backend worker speaking the framed JSON protocol: answers
//! `{"cmd":"ping"}` with `{"status":"alive"}` and any other command with
//! `{"status":"ok"}`, optionally after a synthetic lag. Useful for
//! exercising the router's scaling behavior under uneven load.

mod handler;

pub use handler::WorkerHandler;

use ringlb_wire::{ConnectionServer, ServerConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Synthetic per-request lag in milliseconds
    pub lag_ms: u64,
    /// Size of the connection-handler pool
    pub max_connections: usize,
    /// Live-connection count above which new connections are refused
    pub refuse_threshold: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
            lag_ms: 0,
            max_connections: 100,
            refuse_threshold: 200,
        }
    }
}

/// Run a worker with the given configuration
#[tracing::instrument(skip_all, fields(service.name = "ringlb-worker"))]
pub async fn run(config: WorkerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(lag_ms = config.lag_ms, "initializing worker");

    let handler = Arc::new(WorkerHandler::new(Duration::from_millis(config.lag_ms)));
    let server = ConnectionServer::bind(&ServerConfig {
        host: config.host.clone(),
        port: config.port,
        max_connections: config.max_connections,
        refuse_threshold: config.refuse_threshold,
    })
    .await?;
    server.serve(handler).await?;

    Ok(())
}
