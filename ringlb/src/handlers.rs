//! Command handlers
//!
use ringlb_router::HashKey;
use ringlb_router::config::ConfigBuilder;
use ringlb_worker::WorkerConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Run the hash-ring router
#[allow(clippy::too_many_arguments)]
pub async fn run_router(
    config_file: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    scale_time: Option<u64>,
    quarantine_time: Option<u64>,
    max_con: Option<usize>,
    refuse: Option<usize>,
    max_hash: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ConfigBuilder::from_file(config_file)?;

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(secs) = scale_time {
        config.scale_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = quarantine_time {
        config.quarantine_interval = Duration::from_secs(secs);
    }
    if let Some(max_con) = max_con {
        config.max_connections = max_con;
    }
    if let Some(refuse) = refuse {
        config.refuse_threshold = refuse;
    }
    if let Some(max_hash) = max_hash {
        config.hash_max =
            HashKey::from_f64(max_hash).ok_or("--max-hash must be a non-negative number")?;
    }

    ringlb_router::run(config).await
}

/// Run a sample backend worker
pub async fn run_worker(
    host: Option<String>,
    port: Option<u16>,
    lag: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = WorkerConfig::default();

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(lag) = lag {
        config.lag_ms = lag;
    }

    ringlb_worker::run(config).await
}
