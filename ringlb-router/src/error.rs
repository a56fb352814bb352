//! Error module for the router
//!
use crate::config::ConfigError;
use ringlb_wire::WireError;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the router
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Ring membership violation: duplicate key, key out of range,
    /// removal of an unknown key
    #[error("{0}")]
    Ring(String),
    /// The ring is empty or every position is unavailable
    #[error("No available servers.")]
    NoBackend,
    /// I/O failure talking to a backend
    #[error("backend {addr} unavailable: {reason}")]
    BackendUnavailable {
        /// Backend address
        addr: String,
        /// What went wrong
        reason: String,
    },
    /// Wire-level error
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
    /// Configuration error
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
