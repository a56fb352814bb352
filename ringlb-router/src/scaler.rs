//! Scaler module
//!
//! Periodic control loop that re-weights the ring in response to measured
//! latency. Each cycle computes the request-weighted fleet mean, splits
//! the live backends into hot (above 1.25x the mean) and cool (below the
//! mean, with donor capacity left), resets every window, and then, while
//! donors remain: a hot backend that already serves virtual keys scales
//! down (its delegated load did not help), otherwise a donor takes a new
//! virtual position at the midpoint of the interval preceding the hot
//! backend's position.

use crate::backend::{Backend, BackendStatus};
use crate::gate::Gate;
use crate::key::HashKey;
use crate::ring::Ring;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A backend is hot when its window mean exceeds the fleet mean by this
/// factor
const HOT_THRESHOLD: f64 = 1.25;

/// Latency-driven virtual-position control loop
pub struct Scaler {
    ring: Arc<Gate<Ring>>,
    interval: Duration,
}

impl Scaler {
    /// Create a scaler ticking every `interval`
    pub fn new(ring: Arc<Gate<Ring>>, interval: Duration) -> Self {
        Self { ring, interval }
    }

    /// Run the loop forever
    pub async fn run(self) {
        loop {
            tokio::time::sleep(self.interval).await;
            debug!("running scale pass");
            self.tick().await;
        }
    }

    /// One scale cycle under the write gate
    pub async fn tick(&self) {
        let mut ring = self.ring.write().await;
        rebalance(&mut ring);
    }
}

fn rebalance(ring: &mut Ring) {
    let mut weighted = 0.0;
    let mut total_requests = 0u64;
    for backend in ring.backends() {
        if backend.status() != BackendStatus::Off {
            let (requests, avg_resp) = backend.stats();
            weighted += avg_resp * requests as f64;
            total_requests += requests;
        }
    }
    if total_requests == 0 {
        // No traffic to react to this cycle.
        return;
    }
    let fleet_avg = weighted / total_requests as f64;
    debug!(avg_resp_secs = fleet_avg, "fleet average response time");

    let mut hot: Vec<Arc<Backend>> = Vec::new();
    let mut cool: Vec<Arc<Backend>> = Vec::new();
    for backend in ring.backends() {
        if backend.status() == BackendStatus::On {
            let (requests, avg_resp) = backend.stats();
            if requests > 0 {
                if avg_resp > fleet_avg * HOT_THRESHOLD {
                    debug!(
                        key = %backend.primary_key(),
                        avg_resp_secs = avg_resp,
                        "backend requires scaling"
                    );
                    hot.push(backend.clone());
                } else if avg_resp < fleet_avg && !backend.has_max_scale() {
                    cool.push(backend.clone());
                }
            }
        }
        backend.reset_stats();
    }

    for backend in hot {
        if cool.is_empty() {
            break;
        }
        if backend.has_vkeys() {
            debug!(key = %backend.primary_key(), "scaling down");
            ring.remove_all_virtuals(&backend);
            continue;
        }

        let Some(index) = ring.index_of(backend.primary_key()) else {
            // Quarantined since classification; nothing to split.
            continue;
        };
        let Some((lo, hi)) = ring.scale_bounds(index) else {
            continue;
        };
        let vkey = HashKey::midpoint(lo, hi);
        if ring.owner(vkey).is_some() {
            // The midpoint is already taken, possibly by a quarantined
            // primary; leave this backend alone.
            continue;
        }
        if let Some(donor) = cool.pop() {
            debug!(
                donor = %donor.primary_key(),
                hot = %backend.primary_key(),
                %vkey,
                "scaling up"
            );
            let _ = ring.add_virtual(vkey, &donor);
        }
    }
}
