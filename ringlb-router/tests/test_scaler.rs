//! Tests for the latency-driven scale cycle
//!
use ringlb_router::prelude::*;

mod common;
use common::*;

/// A ring of live backends that never touches the network; load is
/// injected straight into the stats windows.
async fn live_ring(keys: &[u32]) -> (Arc<Gate<Ring>>, Vec<Arc<Backend>>) {
    let ring = shared_ring();
    let mut backends = Vec::new();
    for &k in keys {
        let backend = Arc::new(Backend::new("localhost", 5000 + k as u16, key(k), true));
        backend.set_status(BackendStatus::On);
        register(&ring, &backend).await;
        backends.push(backend);
    }
    (ring, backends)
}

fn inject_load(backend: &Backend, requests: u32, rtt: Duration) {
    for _ in 0..requests {
        backend.record_rtt(rtt);
    }
}

#[tokio::test]
async fn hot_backend_gets_a_virtual_position_from_a_cool_donor() {
    let (ring, backends) = live_ring(&[0, 180, 270]).await;
    let scaler = Scaler::new(ring.clone(), Duration::from_secs(60));

    // The backend at 180 is slow; the others are quick.
    inject_load(&backends[0], 10, Duration::from_millis(10));
    inject_load(&backends[1], 10, Duration::from_millis(500));
    inject_load(&backends[2], 10, Duration::from_millis(10));

    scaler.tick().await;

    let ring = ring.read().await;
    // The interval (0, 180] was split at its midpoint.
    assert!(ring.contains(key(90)));
    // Donors pop LIFO, so the backend at 270 took the position.
    let donor = ring.owner(key(90)).expect("virtual key owner");
    assert!(Arc::ptr_eq(donor, &backends[2]));
    assert_eq!(backends[2].vkeys(), vec![key(90)]);
    // Keys in (0, 90] now route to the donor instead of the hot backend.
    let index = ring.owner_index(key(80)).expect("lookup");
    assert_eq!(ring.positions()[index], key(90));
    // Every window was reset.
    for backend in &backends {
        assert_eq!(backend.stats(), (0, 0.0));
    }
}

#[tokio::test]
async fn hot_donor_scales_down_by_dropping_its_virtuals() {
    let (ring, backends) = live_ring(&[0, 180, 270]).await;
    let scaler = Scaler::new(ring.clone(), Duration::from_secs(60));

    // First cycle: 180 is hot, 270 donates the midpoint at 90.
    inject_load(&backends[0], 10, Duration::from_millis(10));
    inject_load(&backends[1], 10, Duration::from_millis(500));
    inject_load(&backends[2], 10, Duration::from_millis(10));
    scaler.tick().await;
    assert!(ring.read().await.contains(key(90)));

    // Second cycle: the former donor is itself hot now. Scale-down fires
    // on a hot backend whose own vkey list is non-empty and clears it.
    inject_load(&backends[0], 10, Duration::from_millis(10));
    inject_load(&backends[1], 10, Duration::from_millis(10));
    inject_load(&backends[2], 10, Duration::from_millis(500));
    scaler.tick().await;

    let ring = ring.read().await;
    assert!(!ring.contains(key(90)));
    assert!(ring.owner(key(90)).is_none());
    assert!(!backends[2].has_vkeys());
    assert_eq!(ring.positions(), &[key(0), key(180), key(270)]);
}

#[tokio::test]
async fn hot_backend_at_the_origin_splits_the_wrap_interval() {
    let (ring, backends) = live_ring(&[0, 180, 270]).await;
    let scaler = Scaler::new(ring.clone(), Duration::from_secs(60));

    inject_load(&backends[0], 10, Duration::from_millis(500));
    inject_load(&backends[1], 10, Duration::from_millis(10));
    inject_load(&backends[2], 10, Duration::from_millis(10));

    scaler.tick().await;

    // The interval preceding position 0 runs from 270 up to hash max.
    let ring = ring.read().await;
    assert!(ring.contains(key(315)));
}

#[tokio::test]
async fn no_traffic_means_no_reaction() {
    let (ring, _backends) = live_ring(&[0, 180, 270]).await;
    let scaler = Scaler::new(ring.clone(), Duration::from_secs(60));

    scaler.tick().await;

    let ring = ring.read().await;
    assert_eq!(ring.positions(), &[key(0), key(180), key(270)]);
}

#[tokio::test]
async fn single_backend_never_counts_as_hot() {
    let (ring, backends) = live_ring(&[180]).await;
    let scaler = Scaler::new(ring.clone(), Duration::from_secs(60));

    inject_load(&backends[0], 10, Duration::from_millis(500));
    scaler.tick().await;

    let ring = ring.read().await;
    assert_eq!(ring.positions(), &[key(180)]);
    assert!(!backends[0].has_vkeys());
}

#[tokio::test]
async fn donor_at_max_scale_is_not_eligible() {
    let (ring, backends) = live_ring(&[0, 180]).await;
    let scaler = Scaler::new(ring.clone(), Duration::from_secs(60));

    // The only would-be donor is already at its virtual-key cap.
    {
        let mut ring = ring.write().await;
        ring.add_virtual(key(10), &backends[0]).expect("virtual");
        ring.add_virtual(key(20), &backends[0]).expect("virtual");
    }

    inject_load(&backends[0], 10, Duration::from_millis(10));
    inject_load(&backends[1], 10, Duration::from_millis(500));
    scaler.tick().await;

    let ring = ring.read().await;
    // No midpoint appeared: the cool list was empty.
    assert_eq!(
        ring.positions(),
        &[key(0), key(10), key(20), key(180)]
    );
}

#[tokio::test]
async fn off_backends_are_left_out_of_the_cycle() {
    let (ring, backends) = live_ring(&[0, 180, 270]).await;
    let scaler = Scaler::new(ring.clone(), Duration::from_secs(60));

    inject_load(&backends[0], 10, Duration::from_millis(10));
    inject_load(&backends[1], 10, Duration::from_millis(500));
    inject_load(&backends[2], 10, Duration::from_millis(10));
    // The fast backend that would have donated went dark.
    backends[2].set_status(BackendStatus::Off);

    scaler.tick().await;

    let ring = ring.read().await;
    // Only backend 0 was a donor candidate; the midpoint is still 90.
    let donor = ring.owner(key(90)).expect("virtual key owner");
    assert!(Arc::ptr_eq(donor, &backends[0]));
}
