//! Dashboard configuration, loaded from a JSON file with bundled defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::data::{default_health_checks, default_sources, HealthCheck, MetricSource, DEFAULT_PLACEHOLDERS};
use crate::error::ConfigError;

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV: &str = "CIVICSTATS_CONFIG";

const APP_DIR: &str = "civicstats";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub municipality_name: String,
    /// IBGE municipality code
    pub municipality_code: String,
    /// Per-request timeout for upstream calls
    pub request_timeout_secs: u64,
    pub placeholder_tokens: Vec<String>,
    pub sources: Vec<MetricSource>,
    /// Portals only checked for reachability during a sync
    pub health_checks: Vec<HealthCheck>,
    /// Where the key/value storage file lives; defaults to the user config dir
    pub storage_path: Option<PathBuf>,
    pub window_size: [f32; 2],
    /// Delay before revealing a chart card after it becomes visible
    pub reveal_delay_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            municipality_name: "São João de Meriti".to_string(),
            municipality_code: "3305109".to_string(),
            request_timeout_secs: 12,
            placeholder_tokens: DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect(),
            sources: default_sources(),
            health_checks: default_health_checks(),
            storage_path: None,
            window_size: [1200.0, 800.0],
            reveal_delay_ms: 400,
        }
    }
}

impl DashboardConfig {
    /// Read a config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `$CIVICSTATS_CONFIG`, then the user config dir, falling back
    /// to defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let candidate = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json")));

        match candidate {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            _ => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    /// Storage file location, if one can be determined
    pub fn resolved_storage_path(&self) -> Option<PathBuf> {
        self.storage_path
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR).join("storage.json")))
    }
}
