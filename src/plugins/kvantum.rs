//! Kvantum, the SVG theme engine for Qt applications.
//!
//! The active theme is `[General] theme` in `~/.config/Kvantum/kvantum.kvconfig`.
//! Installed themes are directories holding a `<name>.kvconfig` file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::formats::ini;
use super::{HostPaths, PluginError, PluginId, ThemeAdapter};
use crate::common::utils::{private_path, write_atomic};

const SECTION: &str = "General";
const THEME_KEY: &str = "theme";

pub struct KvantumAdapter {
    paths: HostPaths,
}

impl KvantumAdapter {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths }
    }

    fn user_dir(&self) -> PathBuf {
        self.paths.config_dir.join("Kvantum")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.user_dir().join("kvantum.kvconfig")
    }
}

impl ThemeAdapter for KvantumAdapter {
    fn id(&self) -> PluginId {
        PluginId::Kvantum
    }

    fn available(&self) -> bool {
        self.user_dir().is_dir()
    }

    fn available_themes(&self) -> Result<BTreeMap<String, String>, PluginError> {
        let mut themes = BTreeMap::new();
        for dir in [self.user_dir(), self.paths.system("/usr/share/Kvantum")] {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                if entry.path().join(format!("{name}.kvconfig")).is_file() {
                    themes.insert(name.clone(), name);
                }
            }
        }
        Ok(themes)
    }

    fn write_theme(&self, theme: &str) -> Result<PathBuf, PluginError> {
        let path = self.settings_path();
        if !path.is_file() {
            return Err(PluginError::ConfigNotFound {
                plugin: PluginId::Kvantum.display_name(),
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
