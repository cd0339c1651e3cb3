//! Environment-derived paths and flags.
//!
//! The monitoring agent exports its directories through `MK_CONFDIR` and
//! `MK_VARDIR`; `DEBUG` turns on verbose logging. Absent or empty variables
//! fall back to built-in defaults.

use std::path::PathBuf;

pub const DEFAULT_CONFIG_DIR: &str = "/etc/check_mk";
pub const CONFIG_FILE_NAME: &str = "linet_caddy_metrics.json";
pub const STATE_FILE_NAME: &str = "linet_caddy_metrics.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEnv {
    pub config_path: PathBuf,
    pub state_path: PathBuf,
    pub debug: bool,
}

impl ProbeEnv {
    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let config_dir = non_empty("MK_CONFDIR").unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string());
        let state_path = match non_empty("MK_VARDIR") {
            Some(var_dir) => PathBuf::from(var_dir).join("persisted").join(STATE_FILE_NAME),
            None => PathBuf::from(STATE_FILE_NAME),
        };

        Self {
            config_path: PathBuf::from(config_dir).join(CONFIG_FILE_NAME),
            state_path,
            debug: env_to_bool(lookup("DEBUG").as_deref()),
        }
    }
}

fn env_to_bool(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "yes" | "true"))
}
