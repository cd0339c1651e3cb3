//! Probe configuration file parser.
//!
//! The file is a flat key-value document. JSON is the default format; a
//! path ending in `.toml` is read as TOML instead.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_METRICS_URL: &str = "http://localhost:2019/metrics";
pub const DEFAULT_SERVICE_NAME: &str = "Caddy status";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub metrics_url: Option<String>,
    pub service_name: Option<String>,
    /// Fetch timeout, e.g. "4s", "500ms", "1m".
    pub timeout: Option<String>,
    /// Print a CRITICAL line instead of staying silent when the fetch fails.
    pub report_fetch_failure: Option<bool>,
}

impl ProbeConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let config = if is_toml {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };
        Ok(config)
    }

    /// Load the config file, falling back to defaults when it is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => {
                debug!(?path, "probe config loaded");
                config
            }
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(?path, "no probe config, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "ignoring probe config");
                Self::default()
            }
        }
    }

    pub fn metrics_url(&self) -> &str {
        self.metrics_url.as_deref().unwrap_or(DEFAULT_METRICS_URL)
    }

    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
            .as_deref()
            .and_then(parse_duration)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn report_fetch_failure(&self) -> bool {
        self.report_fetch_failure.unwrap_or(false)
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
