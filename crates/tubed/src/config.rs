//! TOML configuration for the TritonTube daemon.
//!
//! Every value has a default, so a missing config file works out of the
//! box; CLI flags override file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Front-end settings.
    pub web: WebSection,
    /// Storage node settings.
    pub storage: StorageSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[web]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WebSection {
    /// Address the HTTP front-end listens on.
    pub listen_addr: String,
    /// Directory for the video metadata store.
    pub metadata_dir: PathBuf,
    /// Content backend: `"fs"` (local filesystem) or `"cluster"`.
    pub content: String,
    /// Backend options: a base directory for `fs`, or
    /// `adminAddr,nodeAddr1,nodeAddr2,…` for `cluster`.
    pub content_options: String,
    /// Per-call deadline for storage RPCs, in seconds. 0 disables it.
    pub rpc_timeout_secs: u64,
}

impl Default for WebSection {
    fn default() -> Self {
        let metadata_dir = dirs::home_dir()
            .map(|h| h.join(".tritontube").join("meta"))
            .unwrap_or_else(|| PathBuf::from(".tritontube/meta"));
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            metadata_dir,
            content: "fs".to_string(),
            content_options: "./videos".to_string(),
            rpc_timeout_secs: 5,
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Address the storage node listens on.
    pub listen_addr: String,
    /// Directory segments are stored under.
    pub data_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8090".to_string(),
            data_dir: PathBuf::from("./segments"),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                Ok(toml::from_str(&content)?)
            }
            None => Ok(Self::default()),
        }
    }
}
