//! Ringlb library
//!
mod commands;
mod handlers;

use clap::Parser;
pub use commands::RinglbCommands;
pub use handlers::{run_router, run_worker};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ringlb")]
#[command(about = "Consistent-hash request router and sample worker CLI", long_about = None)]
struct RinglbCli {
    #[command(subcommand)]
    command: RinglbCommands,
}

/// Run the ringlb CLI
///
/// This function parses the CLI arguments and runs the appropriate command.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = RinglbCli::parse();

    match cli.command {
        RinglbCommands::Router {
            config,
            host,
            port,
            scale_time,
            quarantine_time,
            max_con,
            refuse,
            max_hash,
        } => {
            run_router(
                config,
                host,
                port,
                scale_time,
                quarantine_time,
                max_con,
                refuse,
                max_hash,
            )
            .await?
        }
        RinglbCommands::Worker {
            host,
            port,
            lag,
        } => run_worker(host, port, lag).await?,
    }

    Ok(())
}
