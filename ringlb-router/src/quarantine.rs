//! Quarantine module
//!
//! Periodic control loop that moves dead backends out of the active ring
//! and probes quarantined ones for recovery. Only primary positions
//! migrate between the active and offline lists; a quarantined backend's
//! virtual keys are dropped outright when its primary goes offline.

use crate::backend::{Backend, BackendStatus};
use crate::gate::Gate;
use crate::key::HashKey;
use crate::ring::Ring;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Dead-backend sweep and recovery loop
pub struct Quarantine {
    ring: Arc<Gate<Ring>>,
    interval: Duration,
}

impl Quarantine {
    /// Create a quarantine loop ticking every `interval`
    pub fn new(ring: Arc<Gate<Ring>>, interval: Duration) -> Self {
        Self { ring, interval }
    }

    /// Run the loop forever
    pub async fn run(self) {
        loop {
            tokio::time::sleep(self.interval).await;
            debug!("running quarantine pass");
            self.tick().await;
        }
    }

    /// One sweep under the write gate
    pub async fn tick(&self) {
        let mut ring = self.ring.write().await;

        // Primaries whose backend went dark since the last sweep.
        let mut deactivate: Vec<(HashKey, Arc<Backend>)> = Vec::new();
        for &position in ring.positions() {
            if let Some(backend) = ring.owner(position) {
                if backend.primary_key() == position && backend.status() == BackendStatus::Off {
                    deactivate.push((position, backend.clone()));
                }
            }
        }

        // Probe every quarantined backend; survivors come back.
        let probes: Vec<(HashKey, Arc<Backend>)> = ring
            .offline()
            .iter()
            .filter_map(|&position| ring.owner(position).map(|b| (position, b.clone())))
            .collect();
        let mut reactivate: Vec<HashKey> = Vec::new();
        for (position, backend) in probes {
            match backend.connect().await {
                Ok(()) => {
                    info!(key = %position, addr = %backend.addr(), "backend recovered");
                    reactivate.push(position);
                }
                Err(e) => {
                    debug!(key = %position, error = %e, "backend still offline");
                }
            }
        }

        for (position, backend) in deactivate {
            info!(key = %position, addr = %backend.addr(), "backend moved offline");
            ring.remove_all_virtuals(&backend);
            ring.move_to_offline(position);
        }
        for position in reactivate {
            ring.move_to_online(position);
        }
    }
}
