//! GTK 3 applications, through `~/.config/gtk-3.0/settings.ini`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::formats::ini;
use super::{HostPaths, PluginError, PluginId, ThemeAdapter};
use crate::common::utils::{private_path, write_atomic};

const SECTION: &str = "Settings";
const THEME_KEY: &str = "gtk-theme-name";

pub struct GtkAdapter {
    paths: HostPaths,
}

impl GtkAdapter {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths }
    }

    fn settings_dir(&self) -> PathBuf {
        self.paths.config_dir.join("gtk-3.0")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings_dir().join("settings.ini")
    }

    fn theme_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.paths.home.join(".themes"),
            self.paths.data_dir.join("themes"),
            self.paths.system("/usr/share/themes"),
        ]
    }
}

impl ThemeAdapter for GtkAdapter {
    fn id(&self) -> PluginId {
        PluginId::Gtk
    }

    fn available(&self) -> bool {
        self.settings_dir().is_dir()
    }

    fn available_themes(&self) -> Result<BTreeMap<String, String>, PluginError> {
        let mut themes = BTreeMap::new();
        for dir in self.theme_dirs() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                // Icon and cursor themes share these directories; only GTK 3
                // themes carry a gtk-3.0 subdirectory.
                if entry.path().join("gtk-3.0").is_dir()
                    && let Some(name) = entry.file_name().to_str()
                {
                    themes.insert(name.to_string(), name.to_string());
                }
            }
        }
        Ok(themes)
    }

    fn write_theme(&self, theme: &str) -> Result<PathBuf, PluginError> {
        let path = self.settings_path();
        if !path.is_file() {
            return Err(PluginError::ConfigNotFound {
                plugin: PluginId::Gtk.display_name(),
            });
        }

        let text = std::fs::read_to_string(&path).map_err(|e| PluginError::io(&path, e))?;
        let updated = ini::set_key(&text, SECTION, THEME_KEY, theme);
        write_atomic(&path, updated.as_bytes()).map_err(|e| PluginError::Write {
            path: private_path(&path),
            reason: format!("{e:#}"),
        })?;
        Ok(path)
    }
}
