//! Ringlb wire library
//!
//! Shared TCP plumbing for the router and the workers: the sentinel-framed
//! JSON codec, the command-handler port, and the bounded connection server.

pub(crate) mod frame;
pub(crate) mod port;
pub(crate) mod server;

pub mod error;

pub use error::{Result, WireError};
pub use frame::{FrameStream, SENTINEL};
pub use port::CommandHandler;
pub use server::{ConnectionServer, ServerConfig};
