//! Persisted configuration for yin-yang.
//!
//! The configuration is a single JSON document shared by the command line, the
//! daemon and any settings editor. It is small enough to be re-read before
//! every decision, so nothing caches it across iterations.
//!
//! ## Location
//!
//! `$XDG_CONFIG_HOME/yin_yang/yin_yang.json`, or `<dir>/yin_yang.json` when a
//! directory was passed with `--config`.
//!
//! ## Structure
//!
//! ```json
//! {
//!     "dark_mode": false,
//!     "schedule": true,
//!     "follow_sun": false,
//!     "latitude": 52.52,
//!     "longitude": 13.405,
//!     "start_time": "20:00",
//!     "end_time": "07:00",
//!     "running": false,
//!     "enabled_plugins": ["vscode", "gtk"],
//!     "plugin_themes": {
//!         "vscode": { "light": "Default Light+", "dark": "Dracula" }
//!     }
//! }
//! ```
//!
//! `start_time` is when dark mode begins and `end_time` when it ends. Missing
//! keys take their defaults, unknown keys and unknown plugin names are
//! ignored. All access goes through [`ConfigStore`], which serializes
//! read-modify-write cycles across processes.

pub mod loading;
pub mod store;
pub mod validation;
pub mod watcher;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::common::constants::*;
use crate::core::theme::ThemeState;
use crate::plugins::{PluginId, ThemePair};

pub use loading::{get_config_path, get_custom_config_dir, set_config_dir};
pub use store::ConfigStore;
pub use validation::validate_config;
pub use watcher::start_config_watcher;

/// Which automatic mode drives theme decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMode {
    /// Only explicit toggles change the theme.
    Manual,
    /// Fixed daily dark window between `start_time` and `end_time`.
    Schedule,
    /// Light between sunrise and sunset at the configured coordinates.
    FollowSun,
}

impl ActivationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationMode::Manual => "manual",
            ActivationMode::Schedule => "schedule",
            ActivationMode::FollowSun => "follow sun",
        }
    }
}

/// Failures reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to lock {path}: {source}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The persisted configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme that is, or should be, applied.
    pub dark_mode: bool,
    pub schedule: bool,
    pub follow_sun: bool,
    pub latitude: f64,
    pub longitude: f64,
    /// Time of day dark mode begins.
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    /// Time of day dark mode ends.
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    /// Set while a daemon is active. Clearing it asks the daemon to stop.
    pub running: bool,
    #[serde(deserialize_with = "known_plugins")]
    pub enabled_plugins: BTreeSet<PluginId>,
    #[serde(deserialize_with = "known_plugin_themes")]
    pub plugin_themes: BTreeMap<PluginId, ThemePair>,
}

impl Default for Config {
    fn default() -> Self {
        let (start_h, start_m) = DEFAULT_DARK_START;
        let (end_h, end_m) = DEFAULT_DARK_END;
        Self {
            dark_mode: false,
            schedule: false,
            follow_sun: false,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            start_time: NaiveTime::from_hms_opt(start_h, start_m, 0).unwrap_or(NaiveTime::MIN),
            end_time: NaiveTime::from_hms_opt(end_h, end_m, 0).unwrap_or(NaiveTime::MIN),
            running: false,
            enabled_plugins: [PluginId::VsCode, PluginId::Gtk].into_iter().collect(),
            plugin_themes: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The mode that decides the theme. `follow_sun` wins when both automatic
    /// modes are set.
    pub fn activation_mode(&self) -> ActivationMode {
        if self.follow_sun {
            ActivationMode::FollowSun
        } else if self.schedule {
            ActivationMode::Schedule
        } else {
            ActivationMode::Manual
        }
    }

    pub fn has_automatic_mode(&self) -> bool {
        self.activation_mode() != ActivationMode::Manual
    }

    pub fn theme(&self) -> ThemeState {
        ThemeState::from_dark_mode(self.dark_mode)
    }

    pub fn is_plugin_enabled(&self, id: PluginId) -> bool {
        self.enabled_plugins.contains(&id)
    }

    /// Theme names for `id`, falling back to the plugin's defaults.
    pub fn themes_for(&self, id: PluginId) -> ThemePair {
        self.plugin_themes
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.default_themes())
    }

    /// Turn every automatic mode off. Used by manual toggles.
    pub fn clear_automatic_modes(&mut self) {
        self.running = false;
        self.schedule = false;
        self.follow_sun = false;
    }

    /// Log the settings that matter for the active mode.
    pub fn log_config(&self, source: &str) {
        log_block_start!("Loaded configuration from {}", source);
        log_indented!("Mode: {}", self.activation_mode().as_str());
        log_indented!("Current theme: {}", self.theme());

        match self.activation_mode() {
            ActivationMode::Schedule => {
                log_indented!(
                    "Dark from {} to {}",
                    self.start_time.format(TIME_FORMAT),
                    self.end_time.format(TIME_FORMAT)
                );
            }
            ActivationMode::FollowSun => {
                log_indented!("Coordinates: {:.4}°, {:.4}°", self.latitude, self.longitude);
            }
            ActivationMode::Manual => {}
        }

        let enabled: Vec<&str> = self.enabled_plugins.iter().map(PluginId::as_str).collect();
        if enabled.is_empty() {
            log_indented!("Plugins: none enabled");
        } else {
            log_indented!("Plugins: {}", enabled.join(", "));
        }
    }
}

/// `"HH:MM"` on disk; `"HH:MM:SS"` is accepted on read.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use crate::common::constants::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        let trimmed = text.trim();
        NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|_| D::Error::custom(format!("invalid time of day \"{text}\", expected HH:MM")))
    }
}

/// Plugin names from other versions are skipped rather than failing the load.
fn known_plugins<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<PluginId>, D::Error> {
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names.iter().filter_map(|name| name.parse().ok()).collect())
}

fn known_plugin_themes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<PluginId, ThemePair>, D::Error> {
    let entries = BTreeMap::<String, ThemePair>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|(name, pair)| name.parse().ok().map(|id| (id, pair)))
        .collect())
}
