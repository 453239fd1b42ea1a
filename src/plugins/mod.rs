//! Theme adapters for the applications yin-yang controls.
//!
//! Each supported application is a closed variant of [`PluginId`] backed by a
//! [`ThemeAdapter`] implementation. The adapter knows where the application
//! keeps its settings and which themes are installed; [`Plugin`] wraps an
//! adapter with the user's enablement and light/dark theme choice and enforces
//! the rules every adapter shares (empty theme names are rejected, disabled or
//! missing applications are left alone).
//!
//! ## Supported applications
//!
//! - [`vscode`]: VS Code family editors (`settings.json`, JSON)
//! - [`gtk`]: GTK 3 applications (`settings.ini`)
//! - [`kvantum`]: Kvantum Qt style engine (`kvantum.kvconfig`)
//! - [`konsole`]: KDE Konsole terminal (default profile)
//!
//! Adapters never patch text with patterns: settings are parsed with the
//! helpers in [`formats`], one key is changed, and the whole file is written
//! back atomically.

pub mod formats;
pub mod gtk;
pub mod konsole;
pub mod kvantum;
pub mod paths;
pub mod registry;
pub mod vscode;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::core::theme::ThemeState;

pub use paths::HostPaths;
pub use registry::{PluginRegistry, create_adapter};

/// Identifier of a supported target application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginId {
    #[serde(rename = "vscode", alias = "code")]
    VsCode,
    Gtk,
    Kvantum,
    Konsole,
}

impl PluginId {
    /// Every supported plugin, in registry order.
    pub const ALL: [PluginId; 4] = [
        PluginId::VsCode,
        PluginId::Gtk,
        PluginId::Kvantum,
        PluginId::Konsole,
    ];

    /// Identifier used in the configuration file and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginId::VsCode => "vscode",
            PluginId::Gtk => "gtk",
            PluginId::Kvantum => "kvantum",
            PluginId::Konsole => "konsole",
        }
    }

    /// Human readable application name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PluginId::VsCode => "VS Code",
            PluginId::Gtk => "GTK",
            PluginId::Kvantum => "Kvantum",
            PluginId::Konsole => "Konsole",
        }
    }

    /// Theme names used when the configuration doesn't override them.
    pub fn default_themes(&self) -> ThemePair {
        let (light, dark) = match self {
            PluginId::VsCode => ("Default Light+", "Default Dark+"),
            PluginId::Gtk => ("Adwaita", "Adwaita-dark"),
            PluginId::Kvantum => ("KvFlatLight", "KvFlat"),
            PluginId::Konsole => ("BlackOnWhite", "Breeze"),
        };
        ThemePair::new(light, dark)
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vscode" | "code" => Ok(PluginId::VsCode),
            "gtk" => Ok(PluginId::Gtk),
            "kvantum" => Ok(PluginId::Kvantum),
            "konsole" => Ok(PluginId::Konsole),
            other => Err(format!("Unknown plugin '{other}'")),
        }
    }
}

/// The application-specific theme names used for light and dark mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePair {
    pub light: String,
    pub dark: String,
}

impl ThemePair {
    pub fn new(light: impl Into<String>, dark: impl Into<String>) -> Self {
        Self {
            light: light.into(),
            dark: dark.into(),
        }
    }

    /// Theme name to apply for `theme`.
    pub fn for_theme(&self, theme: ThemeState) -> &str {
        match theme {
            ThemeState::Light => &self.light,
            ThemeState::Dark => &self.dark,
        }
    }
}

/// Errors raised while reading or changing an application's theme.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Theme \"{0}\" is invalid")]
    InvalidTheme(String),

    #[error(
        "No settings file found for {plugin}. Set a theme in {plugin} manually once so the file is created, then try again."
    )]
    ConfigNotFound { plugin: &'static str },

    #[error("No themes found for {plugin}")]
    NoThemesFound { plugin: &'static str },

    #[error("Malformed settings in {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },
}

impl PluginError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        PluginError::Io {
            path: crate::common::utils::private_path(path),
            source,
        }
    }
}

/// Application-specific half of a plugin.
///
/// Implementations locate the application's files; they don't check
/// enablement or validate theme names, [`Plugin`] does that for all of them.
pub trait ThemeAdapter: Send + Sync {
    fn id(&self) -> PluginId;

    /// Whether the application appears to be installed. Must only check for
    /// the existence of files or directories.
    fn available(&self) -> bool;

    /// Themes discoverable on this host, keyed by the identifier the
    /// application expects, mapped to a display name. May be empty.
    fn available_themes(&self) -> Result<BTreeMap<String, String>, PluginError>;

    /// Write `theme` into the application's settings and return the file that
    /// was changed.
    fn write_theme(&self, theme: &str) -> Result<PathBuf, PluginError>;
}

/// A registered plugin: an adapter plus the user's settings for it.
pub struct Plugin {
    adapter: Box<dyn ThemeAdapter>,
    enabled: bool,
    themes: ThemePair,
}

impl Plugin {
    pub fn new(adapter: Box<dyn ThemeAdapter>, enabled: bool, themes: ThemePair) -> Self {
        Self {
            adapter,
            enabled,
            themes,
        }
    }

    pub fn id(&self) -> PluginId {
        self.adapter.id()
    }

    pub fn name(&self) -> &'static str {
        self.adapter.id().display_name()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn themes(&self) -> &ThemePair {
        &self.themes
    }

    /// Theme name this plugin applies for `theme`.
    pub fn theme_name(&self, theme: ThemeState) -> &str {
        self.themes.for_theme(theme)
    }

    pub(crate) fn configure(&mut self, enabled: bool, themes: ThemePair) {
        self.enabled = enabled;
        self.themes = themes;
    }

    pub fn available(&self) -> bool {
        self.adapter.available()
    }

    /// Themes installed for this application.
    ///
    /// An application that isn't installed has no themes; one that is
    /// installed but exposes none is reported as [`PluginError::NoThemesFound`].
    pub fn available_themes(&self) -> Result<BTreeMap<String, String>, PluginError> {
        if !self.available() {
            return Ok(BTreeMap::new());
        }

        let themes = self.adapter.available_themes()?;
        if themes.is_empty() {
            return Err(PluginError::NoThemesFound {
                plugin: self.name(),
            });
        }
        Ok(themes)
    }

    /// Apply `theme_name` to the application.
    ///
    /// Returns the settings file that was written, or `None` when the plugin is
    /// disabled or the application isn't installed.
    pub fn set_theme(&self, theme_name: &str) -> Result<Option<PathBuf>, PluginError> {
        if theme_name.trim().is_empty() {
            return Err(PluginError::InvalidTheme(theme_name.to_string()));
        }

        if !(self.enabled && self.available()) {
            return Ok(None);
        }

        self.adapter.write_theme(theme_name).map(Some)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id())
            .field("enabled", &self.enabled)
            .field("themes", &self.themes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingAdapter {
        installed: bool,
        themes: BTreeMap<String, String>,
        written: Mutex<Vec<String>>,
    }

    impl RecordingAdapter {
        fn new(installed: bool) -> Self {
            Self {
                installed,
                themes: BTreeMap::new(),
                written: Mutex::new(Vec::new()),
            }
        }
    }

    impl ThemeAdapter for RecordingAdapter {
        fn id(&self) -> PluginId {
            PluginId::Gtk
        }

        fn available(&self) -> bool {
            self.installed
        }

        fn available_themes(&self) -> Result<BTreeMap<String, String>, PluginError> {
            Ok(self.themes.clone())
        }

        fn write_theme(&self, theme: &str) -> Result<PathBuf, PluginError> {
            self.written.lock().unwrap().push(theme.to_string());
            Ok(PathBuf::from("settings.ini"))
        }
    }

    #[test]
    fn test_empty_theme_name_is_invalid() {
        let plugin = Plugin::new(
            Box::new(RecordingAdapter::new(true)),
            true,
            PluginId::Gtk.default_themes(),
        );
        assert!(matches!(
            plugin.set_theme(""),
            Err(PluginError::InvalidTheme(_))
        ));
        assert!(matches!(
            plugin.set_theme("   "),
            Err(PluginError::InvalidTheme(_))
        ));
    }

    #[test]
    fn test_disabled_plugin_is_a_no_op() {
        let plugin = Plugin::new(
            Box::new(RecordingAdapter::new(true)),
            false,
            PluginId::Gtk.default_themes(),
        );
        assert_eq!(plugin.set_theme("Adwaita").unwrap(), None);
    }

    #[test]
    fn test_unavailable_plugin_is_a_no_op() {
        let plugin = Plugin::new(
            Box::new(RecordingAdapter::new(false)),
            true,
            PluginId::Gtk.default_themes(),
        );
        assert_eq!(plugin.set_theme("Adwaita").unwrap(), None);
        assert!(plugin.available_themes().unwrap().is_empty());
    }

    #[test]
    fn test_installed_without_themes_reports_no_themes_found() {
        let plugin = Plugin::new(
            Box::new(RecordingAdapter::new(true)),
            true,
            PluginId::Gtk.default_themes(),
        );
        assert!(matches!(
            plugin.available_themes(),
            Err(PluginError::NoThemesFound { plugin: "GTK" })
        ));
    }

    #[test]
    fn test_enabled_available_plugin_writes() {
        let plugin = Plugin::new(
            Box::new(RecordingAdapter::new(true)),
            true,
            PluginId::Gtk.default_themes(),
        );
        let written = plugin.set_theme(plugin.theme_name(ThemeState::Dark)).unwrap();
        assert_eq!(written, Some(PathBuf::from("settings.ini")));
    }

    #[test]
    fn test_plugin_id_parsing_and_display() {
        for id in PluginId::ALL {
            assert_eq!(id.as_str().parse::<PluginId>().unwrap(), id);
            assert_eq!(id.to_string(), id.as_str());
        }
        assert_eq!("code".parse::<PluginId>().unwrap(), PluginId::VsCode);
        assert!("atom".parse::<PluginId>().is_err());
    }

    #[test]
    fn test_plugin_id_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&PluginId::VsCode).unwrap();
        assert_eq!(json, "\"vscode\"");
        let parsed: PluginId = serde_json::from_str("\"konsole\"").unwrap();
        assert_eq!(parsed, PluginId::Konsole);
    }
}
