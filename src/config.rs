//! # Configuration for the vecstream CLI and server
//!
//! This module covers the ambient configuration for the `vecstream` binary
//! only — the library core ([`crate::collection_manager`] and below) takes
//! every setting it needs as explicit arguments and never reads this file
//! itself. Configuration is stored in YAML in the platform-specific config
//! directory (see [`crate::config_dir`]).
//!
//! ## YAML Configuration Format
//!
//! ```yaml
//! data_dir: "/home/user/.local/share/vecstream"
//! default_k: 10
//! default_threshold: 0.0
//! server_addr: "127.0.0.1:7800"
//! ```
//!
//! All fields have defaults, so a missing or empty file is equivalent to
//! calling [`VecStreamConfig::default`].

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

fn default_data_dir() -> PathBuf {
    crate::config_dir()
        .map(|d| d.join("data"))
        .unwrap_or_else(|_| PathBuf::from("./vecstream-data"))
}

fn default_k() -> usize {
    10
}

fn default_threshold() -> f32 {
    0.0
}

fn default_server_addr() -> String {
    "127.0.0.1:7800".to_string()
}

/// Runtime settings for the `vecstream` CLI/server binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VecStreamConfig {
    /// Base directory holding `collections_metadata.json` and `collections/`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Default `k` for `search` when not given on the command line.
    #[serde(default = "default_k")]
    pub default_k: usize,
    /// Default similarity threshold for `search`.
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,
    /// Bind address for `vecstream serve`.
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
}

impl Default for VecStreamConfig {
    fn default() -> Self {
        VecStreamConfig {
            data_dir: default_data_dir(),
            default_k: default_k(),
            default_threshold: default_threshold(),
            server_addr: default_server_addr(),
        }
    }
}

/// Load configuration from `path`, falling back to defaults (with a warning)
/// if the file is absent or malformed.
pub fn load_config(path: &std::path::Path) -> VecStreamConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "malformed config, using defaults");
            VecStreamConfig::default()
        }),
        Err(_) => VecStreamConfig::default(),
    }
}

/// Write `config` to `path` as YAML, creating parent directories as needed.
pub fn save_config(path: &std::path::Path, config: &VecStreamConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config)?;
    fs::write(path, yaml)?;
    Ok(())
}
