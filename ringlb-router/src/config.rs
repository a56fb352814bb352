//! Router configuration module
//!
use crate::key::HashKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Interval between scale cycles
    #[serde(with = "duration_secs")]
    pub scale_interval: Duration,
    /// Interval between quarantine sweeps
    #[serde(with = "duration_secs")]
    pub quarantine_interval: Duration,
    /// Size of the connection-handler pool
    pub max_connections: usize,
    /// Live-connection count above which new connections are refused
    pub refuse_threshold: usize,
    /// Upper bound of the hash domain
    pub hash_max: HashKey,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5003,
            scale_interval: Duration::from_secs(60),
            quarantine_interval: Duration::from_secs(30),
            max_connections: 100,
            refuse_threshold: 200,
            hash_max: HashKey::from(360u32),
        }
    }
}

/// Config builder
#[derive(Default)]
pub struct ConfigBuilder;

impl ConfigBuilder {
    /// Load configuration from a file (supports JSON and TOML); with no
    /// file, fall back to the defaults
    pub fn from_file(path: Option<impl Into<PathBuf>>) -> Result<RouterConfig, ConfigError> {
        let Some(path) = path else {
            return Ok(RouterConfig::default());
        };
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path));
        }

        let content = std::fs::read_to_string(&path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_string_lossy().to_string()))?;

        match extension.to_lowercase().as_str() {
            "json" => Ok(serde_json::from_str(&content)?),
            "toml" => Ok(toml::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat(
                path.to_string_lossy().to_string(),
            )),
        }
    }
}

/// Config error struct
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parse error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Unsupported file format
    #[error("Unsupported file format: {0}. Supported formats: .json, .toml")]
    UnsupportedFormat(String),
}

mod duration_secs {
    //! Serde helpers: Duration as whole seconds
    //!
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize Duration as seconds (u64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Deserialize Duration from seconds (u64)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
