//! Ringlb router library
//!
//! A TCP-level request router that distributes framed JSON commands across
//! a pool of backend workers by consistent hashing on an angular ring.
//! Hot backends are relieved by virtual ring positions served by
//! under-loaded peers; dead backends are quarantined and re-probed.

pub(crate) mod admin;
pub(crate) mod backend;
pub(crate) mod gate;
pub(crate) mod key;
pub(crate) mod quarantine;
pub(crate) mod ring;
pub(crate) mod router;
pub(crate) mod scaler;

pub mod config;
pub mod error;
pub mod prelude;

pub use admin::AdminHandler;
pub use backend::{Backend, BackendStatus, DEFAULT_MAX_SCALE};
pub use gate::Gate;
pub use key::HashKey;
pub use quarantine::Quarantine;
pub use ring::Ring;
pub use router::Router;
pub use scaler::Scaler;

use config::RouterConfig;
use ringlb_wire::{ConnectionServer, ServerConfig};
use std::sync::Arc;

/// Run the router with the given configuration.
///
/// Binds the listen socket, spawns the scaler and quarantine loops, and
/// serves admin/route commands until shutdown. Ring membership starts
/// empty and is populated through `add` commands.
#[tracing::instrument(skip_all, fields(service.name = "ringlb-router"))]
pub async fn run(config: RouterConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing::info!(hash_max = %config.hash_max, "initializing hash ring router");

    let ring = Arc::new(Gate::new(Ring::new(config.hash_max)));
    let handler = Arc::new(AdminHandler::new(ring.clone()));

    let scaler = Scaler::new(ring.clone(), config.scale_interval);
    let quarantine = Quarantine::new(ring.clone(), config.quarantine_interval);
    tokio::spawn(scaler.run());
    tokio::spawn(quarantine.run());

    let server = ConnectionServer::bind(&ServerConfig {
        host: config.host.clone(),
        port: config.port,
        max_connections: config.max_connections,
        refuse_threshold: config.refuse_threshold,
    })
    .await?;
    server.serve(handler).await?;

    Ok(())
}
