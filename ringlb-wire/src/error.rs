//! Error module for the wire crate
//!

/// Result type alias for wire operations
pub type Result<T> = std::result::Result<T, WireError>;

/// Error types that can occur on the wire
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Network I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Frame was not valid JSON
    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
    /// Peer disconnected in the middle of a frame
    #[error("unexpected end of stream inside a frame")]
    UnexpectedEof,
    /// Listen/bind failed at startup
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the server tried to bind
        addr: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}
