//! Configuration loading and download folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, applied by the binary)
//! 2. Environment variable (via clap `env` attributes, also in the binary)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,

    /// Base URL of the peer-gateway daemon that owns the network connection
    pub gateway_url: String,

    /// Peer network identity
    pub username: String,

    /// Peer network credential
    pub password: String,

    /// Folder completed downloads are written to
    pub download_dir: PathBuf,

    /// Seconds without a received chunk before a transfer attempt is aborted
    pub idle_timeout_secs: u64,

    /// How long the gateway collects network search responses, in milliseconds
    pub search_timeout_ms: u64,

    /// Progress event channel capacity
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5750,
            gateway_url: "http://127.0.0.1:5030".to_string(),
            username: String::new(),
            password: String::new(),
            download_dir: default_download_dir(),
            idle_timeout_secs: 90,
            search_timeout_ms: 3000,
            event_capacity: 100,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or from the platform config
    /// location when no explicit path is given. A missing file yields the
    /// compiled defaults; a malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                let config = toml::from_str(&content).map_err(|e| {
                    Error::Config(format!("Failed to parse {}: {}", path.display(), e))
                })?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }
}

/// Locate the platform config file, if one exists
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("tunegrab").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/tunegrab/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default download folder
fn default_download_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(dirs::download_dir)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tunegrab")
}
