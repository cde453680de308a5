//! Configuration loading for the Clarion service
//!
//! Resolution follows a fixed priority order, highest first:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`CLARION_*`)
//! 3. TOML config file (`~/.config/clarion/clarion.toml`)
//! 4. Compiled defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default base URL of the remote enhancement API
pub const DEFAULT_API_BASE_URL: &str = "https://api.ai-coustics.io/v2";

/// Service configuration, loadable from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// API key for the remote enhancement service.
    /// Absence is only an error once a job is submitted without one.
    pub api_key: Option<String>,

    /// Base URL of the remote enhancement API
    pub api_base_url: String,

    /// Port the HTTP surface listens on
    pub listen_port: u16,

    /// Maximum number of files enhanced concurrently per job
    pub max_concurrency: usize,

    /// Maximum number of jobs retained in the in-memory ledger
    pub max_jobs: usize,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            listen_port: 5740,
            max_concurrency: 10,
            max_jobs: 256,
        }
    }
}

impl TomlConfig {
    /// Default configuration file path for the platform
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("clarion").join("clarion.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicitly given path must exist and parse. A missing file at the
    /// default location falls back to compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Configuration loaded from TOML");
        Ok(config)
    }

    /// Apply `CLARION_*` environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("CLARION_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("CLARION_API_BASE_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        if let Ok(port) = std::env::var("CLARION_PORT") {
            match port.parse() {
                Ok(p) => self.listen_port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid CLARION_PORT"),
            }
        }
        if let Ok(n) = std::env::var("CLARION_MAX_CONCURRENCY") {
            match n.parse() {
                Ok(v) => self.max_concurrency = v,
                Err(_) => tracing::warn!(value = %n, "Ignoring invalid CLARION_MAX_CONCURRENCY"),
            }
        }
    }
}
