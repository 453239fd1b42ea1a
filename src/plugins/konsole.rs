//! KDE Konsole.
//!
//! Konsole stores the color scheme per profile, so the adapter edits the
//! default profile named in `konsolerc`. Without one it falls back to the
//! first profile in the user's profile directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::formats::ini::{self, IniDocument};
use super::{HostPaths, PluginError, PluginId, ThemeAdapter};
use crate::common::utils::{private_path, write_atomic};

const SECTION: &str = "Appearance";
const THEME_KEY: &str = "ColorScheme";

pub struct KonsoleAdapter {
    paths: HostPaths,
}

impl KonsoleAdapter {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths }
    }

    fn rc_path(&self) -> PathBuf {
        self.paths.config_dir.join("konsolerc")
    }

    fn profile_dir(&self) -> PathBuf {
        self.paths.data_dir.join("konsole")
    }

    /// Profile file to edit.
    pub fn profile_path(&self) -> Option<PathBuf> {
        let named = std::fs::read_to_string(self.rc_path())
            .ok()
            .and_then(|text| IniDocument::parse(&text).get("Desktop Entry", "DefaultProfile"))
            .filter(|name| !name.is_empty())
            .map(|name| self.profile_dir().join(name))
            .filter(|path| path.is_file());
        if named.is_some() {
            return named;
        }

        let mut profiles = files_with_extension(&self.profile_dir(), "profile");
        profiles.sort();
        profiles.into_iter().next()
    }
}

fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == extension))
        .collect()
}

/// Display name from a color scheme's `[General] Description`.
fn scheme_description(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    IniDocument::parse(&text)
        .get("General", "Description")
        .filter(|d| !d.is_empty())
}

impl ThemeAdapter for KonsoleAdapter {
    fn id(&self) -> PluginId {
        PluginId::Konsole
    }

    fn available(&self) -> bool {
        self.profile_dir().is_dir() || self.rc_path().is_file()
    }

    fn available_themes(&self) -> Result<BTreeMap<String, String>, PluginError> {
        let mut themes = BTreeMap::new();
        for dir in [self.profile_dir(), self.paths.system("/usr/share/konsole")] {
            for path in files_with_extension(&dir, "colorscheme") {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let display = scheme_description(&path).unwrap_or_else(|| stem.to_string());
                themes.entry(stem.to_string()).or_insert(display);
            }
        }
        Ok(themes)
    }

    fn write_theme(&self, theme: &str) -> Result<PathBuf, PluginError> {
        let path = self.profile_path().ok_or(PluginError::ConfigNotFound {
            plugin: PluginId::Konsole.display_name(),
        })?;

        let text = std::fs::read_to_string(&path).map_err(|e| PluginError::io(&path, e))?;
        let updated = ini::set_key(&text, SECTION, THEME_KEY, theme);
        write_atomic(&path, updated.as_bytes()).map_err(|e| PluginError::Write {
            path: private_path(&path),
            reason: format!("{e:#}"),
        })?;
        Ok(path)
    }
}
