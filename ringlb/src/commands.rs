use clap::Subcommand;
use std::path::PathBuf;

/// Commands for the ringlb CLI
///
/// This enum defines the available commands for the ringlb CLI.
#[derive(Subcommand)]
pub enum RinglbCommands {
    /// Run the hash-ring router
    #[command(alias = "r")]
    Router {
        /// Path to configuration file (JSON or TOML); flags override it
        #[arg(long = "config", value_name = "CONFIG_FILE")]
        config: Option<PathBuf>,

        /// Host to run the router on
        #[arg(short = 'H', long = "host", value_name = "HOST")]
        host: Option<String>,

        /// Port to run the router on
        #[arg(short = 'p', long = "port", value_name = "PORT")]
        port: Option<u16>,

        /// Interval between each scale attempt, in seconds
        #[arg(short = 's', long = "scale-time", value_name = "SECONDS")]
        scale_time: Option<u64>,

        /// Interval between each quarantine attempt, in seconds
        #[arg(short = 'q', long = "quarantine-time", value_name = "SECONDS")]
        quarantine_time: Option<u64>,

        /// Total number of connections handled in parallel
        #[arg(short = 'c', long = "max-con", value_name = "COUNT")]
        max_con: Option<usize>,

        /// Refuse connections beyond this count
        #[arg(short = 'r', long = "refuse", value_name = "COUNT")]
        refuse: Option<usize>,

        /// Maximum hash value
        #[arg(short = 'm', long = "max-hash", value_name = "HASH")]
        max_hash: Option<f64>,
    },
    /// Run a sample backend worker
    #[command(alias = "w")]
    Worker {
        /// Host to run the worker on
        #[arg(short = 'H', long = "host", value_name = "HOST")]
        host: Option<String>,

        /// Port to run the worker on
        #[arg(short = 'p', long = "port", value_name = "PORT")]
        port: Option<u16>,

        /// Simulated per-request lag, in milliseconds
        #[arg(short = 'l', long = "lag", value_name = "MILLISECONDS")]
        lag: Option<u64>,
    },
}
