//! Configuration loading.
//!
//! The config lives at `~/.config/wmbridge/config.toml`. Every field has a
//! default, so a missing or partial file is fine; a broken file is logged
//! and ignored.

mod types;
mod validation;

pub use types::{BackendKind, BridgeConfig, DEFAULT_BUS_NAME, DEFAULT_OBJECT_PATH};
pub use validation::{ValidationWarning, validate_config};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Get the config directory path
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wmbridge"))
}

/// Default location of the config file.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoDirFound)
}

/// Read and parse a config file.
pub fn read_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFailed)?;
    toml::from_str(&content).map_err(ConfigError::ParseFailed)
}

/// Load the config from `path`, or from the default location.
///
/// Returns defaults if the file doesn't exist; logs a warning and returns
/// defaults if it can't be read or parsed.
pub fn load_config(path: Option<&Path>) -> BridgeConfig {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("{}, using defaults", e);
                return BridgeConfig::default();
            }
        },
    };

    if !config_path.exists() {
        tracing::debug!("Config file not found at {:?}, using defaults", config_path);
        return BridgeConfig::default();
    }

    match read_config(&config_path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            config
        }
        Err(e) => {
            tracing::warn!("{} ({:?}), using defaults", e, config_path);
            BridgeConfig::default()
        }
    }
}
