//! Backend client module
//!
//! One `Backend` per configured physical worker: a framed TCP connection,
//! the connection status, the current latency window, and the virtual keys
//! this backend serves as a donor. The socket mutex serializes the single
//! in-flight request the backend protocol allows; the stats mutex is
//! separate and the two are never held together.

use crate::error::{Error, Result};
use crate::key::HashKey;
use ringlb_wire::FrameStream;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{Instant, timeout};
use tracing::debug;

/// Default cap on virtual keys per backend; at the cap the backend stops
/// being eligible as a donor
pub const DEFAULT_MAX_SCALE: usize = 2;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection status of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BackendStatus {
    /// Connected and usable
    On = 0,
    /// Last contact failed; quarantine candidate
    Off = 1,
    /// Registered but never contacted
    Unknown = 2,
}

impl BackendStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::On,
            1 => Self::Off,
            _ => Self::Unknown,
        }
    }
}

/// Latency window, reset each scale cycle
#[derive(Debug, Default)]
struct Stats {
    requests: u64,
    avg_resp: f64,
}

/// Stateful client for one physical worker
#[derive(Debug)]
pub struct Backend {
    host: String,
    port: u16,
    primary_key: HashKey,
    keep_alive: bool,
    max_scale: usize,
    status: AtomicU8,
    stats: Mutex<Stats>,
    vkeys: Mutex<Vec<HashKey>>,
    socket: AsyncMutex<Option<FrameStream<TcpStream>>>,
}

impl Backend {
    /// Create a backend registered at `primary_key`
    pub fn new(host: impl Into<String>, port: u16, primary_key: HashKey, keep_alive: bool) -> Self {
        Self {
            host: host.into(),
            port,
            primary_key,
            keep_alive,
            max_scale: DEFAULT_MAX_SCALE,
            status: AtomicU8::new(BackendStatus::Unknown as u8),
            stats: Mutex::new(Stats::default()),
            vkeys: Mutex::new(Vec::new()),
            socket: AsyncMutex::new(None),
        }
    }

    /// `host:port` for logs and error messages
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ring position the backend was registered at
    pub fn primary_key(&self) -> HashKey {
        self.primary_key
    }

    /// Current connection status
    pub fn status(&self) -> BackendStatus {
        BackendStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Force the connection status; normally driven by `connect` and
    /// `send_request` themselves
    pub fn set_status(&self, status: BackendStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    /// Open the connection if it is not already up.
    ///
    /// Idempotent; on failure the status flips to `Off` and the call
    /// fails with [`Error::BackendUnavailable`].
    pub async fn connect(&self) -> Result<()> {
        let mut socket = self.socket.lock().await;
        if self.status() == BackendStatus::On {
            return Ok(());
        }
        self.open(&mut socket).await
    }

    async fn open(&self, slot: &mut Option<FrameStream<TcpStream>>) -> Result<()> {
        let connected = timeout(
            CONNECT_TIMEOUT,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await;

        match connected {
            Ok(Ok(stream)) => {
                *slot = Some(FrameStream::new(stream));
                self.set_status(BackendStatus::On);
                Ok(())
            }
            Ok(Err(e)) => {
                *slot = None;
                self.set_status(BackendStatus::Off);
                Err(self.unavailable(e.to_string()))
            }
            Err(_) => {
                *slot = None;
                self.set_status(BackendStatus::Off);
                Err(self.unavailable("connect timed out"))
            }
        }
    }

    /// Send one framed request and await its response, timing the round
    /// trip into the stats window.
    ///
    /// Connects first if needed. Without `keep_alive` the socket is torn
    /// down afterwards and the status returns to `Off`. Any I/O failure
    /// also flips the status to `Off` and fails with
    /// [`Error::BackendUnavailable`].
    pub async fn send_request(&self, data: &Value) -> Result<Value> {
        let started = Instant::now();
        let response = self.round_trip(data).await?;
        self.record_rtt(started.elapsed());
        Ok(response)
    }

    async fn round_trip(&self, data: &Value) -> Result<Value> {
        let mut socket = self.socket.lock().await;
        if self.status() != BackendStatus::On || socket.is_none() {
            self.open(&mut socket).await?;
        }

        let outcome = match socket.as_mut() {
            Some(frames) => exchange(frames, data).await,
            None => Err("not connected".to_string()),
        };

        match outcome {
            Ok(response) => {
                if !self.keep_alive {
                    // Dropping the stream closes the socket.
                    *socket = None;
                    self.set_status(BackendStatus::Off);
                }
                Ok(response)
            }
            Err(reason) => {
                *socket = None;
                self.set_status(BackendStatus::Off);
                Err(self.unavailable(reason))
            }
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> Error {
        Error::BackendUnavailable {
            addr: self.addr(),
            reason: reason.into(),
        }
    }

    /// Fold one measured round trip into the window (running mean)
    pub fn record_rtt(&self, rtt: Duration) {
        let mut stats = self.stats.lock().unwrap();
        stats.requests += 1;
        let rtt = rtt.as_secs_f64();
        stats.avg_resp += (rtt - stats.avg_resp) / stats.requests as f64;
        debug!(
            addr = %self.addr(),
            requests = stats.requests,
            avg_resp_secs = stats.avg_resp,
            "stats updated"
        );
    }

    /// Current window as `(requests, mean round trip in seconds)`
    pub fn stats(&self) -> (u64, f64) {
        let stats = self.stats.lock().unwrap();
        (stats.requests, stats.avg_resp)
    }

    /// Clear the window at the end of a scale cycle
    pub fn reset_stats(&self) {
        let mut stats = self.stats.lock().unwrap();
        stats.requests = 0;
        stats.avg_resp = 0.0;
    }

    /// Record a virtual key this backend now serves
    pub fn register_vkey(&self, key: HashKey) {
        self.vkeys.lock().unwrap().push(key);
    }

    /// Virtual keys currently served by this backend
    pub fn vkeys(&self) -> Vec<HashKey> {
        self.vkeys.lock().unwrap().clone()
    }

    /// Whether this backend serves any virtual keys
    pub fn has_vkeys(&self) -> bool {
        !self.vkeys.lock().unwrap().is_empty()
    }

    /// Drain the virtual-key list, returning what it held
    pub fn take_vkeys(&self) -> Vec<HashKey> {
        std::mem::take(&mut *self.vkeys.lock().unwrap())
    }

    /// Whether the backend is at its virtual-key cap
    pub fn has_max_scale(&self) -> bool {
        self.vkeys.lock().unwrap().len() >= self.max_scale
    }
}

async fn exchange(
    frames: &mut FrameStream<TcpStream>,
    data: &Value,
) -> std::result::Result<Value, String> {
    let reply = timeout(ROUND_TRIP_TIMEOUT, async {
        frames.send(data).await?;
        frames.recv().await
    })
    .await;

    match reply {
        Ok(Ok(Some(response))) => Ok(response),
        Ok(Ok(None)) => Err("connection closed by backend".to_string()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("round trip timed out".to_string()),
    }
}
