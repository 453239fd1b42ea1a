//! Configuration path resolution.
//!
//! The directory can be overridden once at startup with `--config`; every
//! later lookup goes through [`get_config_path`].

use anyhow::Result;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::ConfigError;
use crate::common::constants::*;

/// Configuration directory override, set once at startup.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
///
/// Can only be called once; a second call is an error.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// The custom configuration directory, if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Full path of the configuration file.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = get_custom_config_dir() {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }

    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}
