//! Router module
//!
//! The request path: look up the position owning a key, then walk the ring
//! forward until some backend answers. The whole walk runs under the read
//! side of the gate, so it sees one consistent snapshot of the ring.
//! Status flips performed by `send_request` are per-backend atomics, not
//! ring membership, so they are safe under the read side. A failed backend
//! is skipped here and left for the quarantine loop to remove; the hot
//! path never upgrades to the write side.

use crate::backend::BackendStatus;
use crate::error::{Error, Result};
use crate::gate::Gate;
use crate::key::HashKey;
use crate::ring::Ring;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error};

/// Forwards keyed requests to the backend owning the key
#[derive(Clone)]
pub struct Router {
    ring: Arc<Gate<Ring>>,
}

impl Router {
    /// Create a router over the shared ring
    pub fn new(ring: Arc<Gate<Ring>>) -> Self {
        Self { ring }
    }

    /// Route `data` to the backend owning `key`, failing over around the
    /// ring. Exhaustion is a soft failure: the reply envelope carries
    /// `status: false` rather than an error.
    pub async fn route(&self, key: HashKey, data: &Value) -> Value {
        debug!(%key, "routing request");
        let ring = self.ring.read().await;
        match walk_and_send(&ring, key, data).await {
            Ok(response) => response,
            Err(e) => {
                error!(%key, error = %e, "no available servers");
                json!({"status": false, "msg": "No available servers."})
            }
        }
    }
}

async fn walk_and_send(ring: &Ring, key: HashKey, data: &Value) -> Result<Value> {
    let start = ring.owner_index(key)?;

    for index in ring.walk(start) {
        let Some(&position) = ring.positions().get(index) else {
            continue;
        };
        let Some(backend) = ring.owner(position) else {
            continue;
        };
        if backend.status() == BackendStatus::Off {
            continue;
        }
        debug!(%position, addr = %backend.addr(), "trying backend");
        match backend.send_request(data).await {
            Ok(response) => return Ok(response),
            Err(e) => debug!(%position, error = %e, "backend unavailable"),
        }
    }

    Err(Error::NoBackend)
}
