//! Admin command module
//!
//! Dispatches decoded client commands: keyed requests go through the
//! router, `add`/`remove` mutate ring membership under the write gate.
//! Every outcome is a JSON envelope; nothing here escapes as an error.

use crate::backend::Backend;
use crate::gate::Gate;
use crate::key::HashKey;
use crate::ring::Ring;
use crate::router::Router;
use async_trait::async_trait;
use ringlb_wire::CommandHandler;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// One entry of an `add` command
#[derive(Debug, Deserialize)]
struct AddEntry {
    host: String,
    port: u16,
    key: HashKey,
}

/// One entry of a `remove` command
#[derive(Debug, Deserialize)]
struct RemoveEntry {
    key: HashKey,
}

/// Command handler for the router process
pub struct AdminHandler {
    ring: Arc<Gate<Ring>>,
    router: Router,
}

impl AdminHandler {
    /// Create the handler over the shared ring
    pub fn new(ring: Arc<Gate<Ring>>) -> Self {
        Self {
            router: Router::new(ring.clone()),
            ring,
        }
    }

    async fn route(&self, command: &Value) -> Value {
        let Some(raw) = command.get("key").and_then(Value::as_f64) else {
            return failure("Invalid key");
        };
        self.router
            .route(HashKey::saturating_from_f64(raw), command)
            .await
    }

    async fn add(&self, entries: Value) -> Value {
        let entries: Vec<AddEntry> = match serde_json::from_value(entries) {
            Ok(entries) => entries,
            Err(e) => return failure(e.to_string()),
        };
        let backends: Vec<Arc<Backend>> = entries
            .iter()
            .map(|entry| Arc::new(Backend::new(entry.host.clone(), entry.port, entry.key, true)))
            .collect();

        let mut ring = self.ring.write().await;
        for backend in backends {
            let key = backend.primary_key();
            if let Err(e) = ring.add_primary(key, backend) {
                return failure(e.to_string());
            }
            info!(%key, "backend registered");
        }
        json!({"status": true})
    }

    async fn remove(&self, entries: Value) -> Value {
        let entries: Vec<RemoveEntry> = match serde_json::from_value(entries) {
            Ok(entries) => entries,
            Err(e) => return failure(e.to_string()),
        };

        let mut ring = self.ring.write().await;
        for entry in entries {
            if let Err(e) = ring.remove_primary(entry.key) {
                return failure(e.to_string());
            }
            info!(key = %entry.key, "backend removed");
        }
        json!({"status": true})
    }
}

#[async_trait]
impl CommandHandler for AdminHandler {
    async fn handle(&self, command: Value) -> Value {
        if command.get("key").is_some() {
            self.route(&command).await
        } else if let Some(entries) = command.get("add") {
            self.add(entries.clone()).await
        } else if let Some(entries) = command.get("remove") {
            self.remove(entries.clone()).await
        } else {
            failure("Unknown command")
        }
    }
}

fn failure(msg: impl Into<String>) -> Value {
    json!({"status": false, "msg": msg.into()})
}
