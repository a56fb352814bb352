//! Common test fixtures
//!
#![allow(dead_code)] // Each suite uses its own slice of the fixtures

use ringlb_router::prelude::*;
use ringlb_wire::FrameStream;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A real TCP backend answering every frame, with a settable reply delay,
/// a request counter, and a kill switch
pub struct TestBackend {
    /// Bound address
    pub addr: SocketAddr,
    /// Requests answered so far
    pub hits: Arc<AtomicUsize>,
    accept: JoinHandle<()>,
    conns: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl TestBackend {
    /// Spawn on an ephemeral port
    pub async fn spawn(delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test backend");
        Self::from_listener(listener, delay)
    }

    /// Spawn on a specific address (restart scenarios)
    #[allow(dead_code)]
    pub async fn spawn_at(addr: SocketAddr, delay: Duration) -> Self {
        let listener = TcpListener::bind(addr)
            .await
            .expect("rebind test backend");
        Self::from_listener(listener, delay)
    }

    fn from_listener(listener: TcpListener, delay: Duration) -> Self {
        let addr = listener.local_addr().expect("backend local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let conns: Arc<Mutex<Vec<JoinHandle<()>>>> = Arc::new(Mutex::new(Vec::new()));

        let accept = {
            let hits = hits.clone();
            let conns = conns.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let handle = tokio::spawn(serve_conn(stream, delay, hits.clone()));
                    conns.lock().unwrap().push(handle);
                }
            })
        };

        Self {
            addr,
            hits,
            accept,
            conns,
        }
    }

    /// Requests answered so far
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Tear the backend down, closing every open socket; returns the
    /// address so a replacement can bind it
    pub async fn kill(self) -> SocketAddr {
        self.accept.abort();
        let _ = self.accept.await;
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.conns.lock().unwrap());
        for handle in handles {
            handle.abort();
            let _ = handle.await;
        }
        self.addr
    }
}

async fn serve_conn(stream: TcpStream, delay: Duration, hits: Arc<AtomicUsize>) {
    let mut frames = FrameStream::new(stream);
    while let Ok(Some(request)) = frames.recv().await {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        hits.fetch_add(1, Ordering::SeqCst);
        let reply = if request.get("cmd").and_then(Value::as_str) == Some("ping") {
            json!({"status": "alive"})
        } else {
            json!({"status": "ok"})
        };
        if frames.send(&reply).await.is_err() {
            break;
        }
    }
}

/// Convert a plain number into a ring key
pub fn key(value: u32) -> HashKey {
    HashKey::from(value)
}

/// An empty shared ring over the default `[0, 360]` domain
pub fn shared_ring() -> Arc<Gate<Ring>> {
    Arc::new(Gate::new(Ring::new(key(360))))
}

/// Register `backend` at its primary key
#[allow(dead_code)]
pub async fn register(ring: &Arc<Gate<Ring>>, backend: &Arc<Backend>) {
    ring.write()
        .await
        .add_primary(backend.primary_key(), backend.clone())
        .expect("register backend");
}

/// A keep-alive backend client pointed at a test backend
#[allow(dead_code)]
pub fn client_for(target: &TestBackend, primary_key: HashKey) -> Arc<Backend> {
    Arc::new(Backend::new(
        "127.0.0.1",
        target.addr.port(),
        primary_key,
        true,
    ))
}
