//! Connection server module
//!
//! Accepts TCP clients, decodes frames, and dispatches each command to a
//! [`CommandHandler`]. Handler concurrency is bounded by a semaphore of
//! `max_connections` permits; connections beyond `refuse_threshold` are
//! turned away with a `too many connections` reply before they reach the
//! pool.

use crate::error::{Result, WireError};
use crate::frame::FrameStream;
use crate::port::CommandHandler;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpSocket, TcpStream, lookup_host};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Connection server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Size of the handler pool
    pub max_connections: usize,
    /// Live-connection count above which new connections are refused
    pub refuse_threshold: usize,
}

/// TCP accept loop with a bounded worker pool
pub struct ConnectionServer {
    listener: TcpListener,
    refuse_threshold: usize,
    pool: Arc<Semaphore>,
    live: Arc<AtomicUsize>,
}

impl ConnectionServer {
    /// Bind the listen socket with address reuse
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let listener = Self::listen(&config.host, config.port)
            .await
            .map_err(|source| WireError::Bind {
                addr: format!("{}:{}", config.host, config.port),
                source,
            })?;

        Ok(Self {
            listener,
            refuse_threshold: config.refuse_threshold,
            pool: Arc::new(Semaphore::new(config.max_connections)),
            live: Arc::new(AtomicUsize::new(0)),
        })
    }

    async fn listen(host: &str, port: u16) -> std::io::Result<TcpListener> {
        let addr = lookup_host((host, port)).await?.next().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "host did not resolve")
        })?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        socket.listen(1024)
    }

    /// Address the server is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve clients until Ctrl-C
    pub async fn serve(self, handler: Arc<dyn CommandHandler>) -> Result<()> {
        info!(addr = %self.local_addr()?, "listening");

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => self.dispatch(stream, peer, &handler),
                        Err(e) => error!(error = %e, "accept error"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr, handler: &Arc<dyn CommandHandler>) {
        debug!(client_addr = %peer, "connection accepted");

        if self.live.load(Ordering::SeqCst) > self.refuse_threshold {
            warn!(client_addr = %peer, "refusing connection, threshold exceeded");
            tokio::spawn(async move {
                let mut frames = FrameStream::new(stream);
                let _ = frames.send(&json!({"msg": "too many connections"})).await;
            });
            return;
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        let handler = handler.clone();
        let live = self.live.clone();
        let pool = self.pool.clone();

        tokio::spawn(async move {
            // Queue behind the pool; acquire only fails once the semaphore
            // is closed, which never happens while the server runs.
            if let Ok(_permit) = pool.acquire_owned().await {
                if let Err(e) = handle_client(stream, handler).await {
                    debug!(client_addr = %peer, error = %e, "client handler ended");
                }
            }
            live.fetch_sub(1, Ordering::SeqCst);
            debug!(client_addr = %peer, "connection closed");
        });
    }
}

/// Serve one client: decode, dispatch, reply, until EOF or a bad frame
async fn handle_client(stream: TcpStream, handler: Arc<dyn CommandHandler>) -> Result<()> {
    let mut frames = FrameStream::new(stream);
    while let Some(request) = frames.recv().await? {
        debug!(request = %request, "received");
        let reply = handler.handle(request).await;
        frames.send(&reply).await?;
        debug!(reply = %reply, "sent");
    }
    Ok(())
}
