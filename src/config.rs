//! Application settings.
//!
//! Read from `pickme.json` in the working directory when present; every
//! field falls back to its default when absent.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Settings file looked up at startup.
pub const CONFIG_FILE: &str = "pickme.json";

/// Log verbosity used when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string understood by `env_logger`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where bandpass presets are kept between sessions.
    pub filter_store: PathBuf,
    /// Catalog written on every shutdown, independent of the user's save path.
    pub backup_catalog: PathBuf,
    /// Author recorded in the creation info of new picks.
    pub author: String,
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            filter_store: PathBuf::from(".pick_filters.json"),
            backup_catalog: PathBuf::from(".picks-backup.xml"),
            author: "pickme".to_string(),
            log_level: LogLevel::default(),
        }
    }
}

/// Load settings from `path`.
///
/// If the file doesn't exist, returns defaults.
/// If the file exists but is invalid, logs a warning and returns defaults.
pub fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        log::info!("No settings file at {:?}, using defaults", path);
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "Loaded settings from {:?} (presets: {:?}, backup: {:?})",
                    path,
                    config.filter_store,
                    config.backup_catalog
                );
                config
            }
            Err(e) => {
                log::warn!("Failed to parse {:?}: {}, using defaults", path, e);
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read {:?}: {}, using defaults", path, e);
            AppConfig::default()
        }
    }
}
