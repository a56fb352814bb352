//! Prelude module
//!

// Re-export internal types for convenience
pub use crate::{
    admin::AdminHandler,
    backend::{Backend, BackendStatus, DEFAULT_MAX_SCALE},
    config::{ConfigBuilder, ConfigError, RouterConfig},
    error::{Error, Result},
    gate::Gate,
    key::HashKey,
    quarantine::Quarantine,
    ring::Ring,
    router::Router,
    scaler::Scaler,
};

// Re-used types for convenience

// Arc for shared references
pub use std::sync::Arc;
// Duration for time intervals
pub use std::time::Duration;
