//! VS Code and its forks (VSCodium, Code - OSS, Insiders).
//!
//! The color theme lives under `workbench.colorTheme` in the editor's user
//! `settings.json`. Installed themes are read from extension manifests.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::formats::json;
use super::{HostPaths, PluginError, PluginId, ThemeAdapter};
use crate::common::utils::{first_existing_file, write_atomic};

/// Settings key holding the active color theme.
pub const THEME_KEY: &str = "workbench.colorTheme";

/// Editor configuration directories under `$XDG_CONFIG_HOME`, in preference
/// order.
const EDITOR_DIRS: &[&str] = &["VSCodium", "Code - OSS", "Code", "Code - Insiders"];

/// Extension directories relative to the home directory.
const USER_EXTENSION_DIRS: &[&str] = &[
    ".vscode/extensions",
    ".vscode-insiders/extensions",
    ".vscode-oss/extensions",
];

/// System-wide extension directories shipped by distribution packages.
const SYSTEM_EXTENSION_DIRS: &[&str] = &[
    "/usr/lib/code/extensions",
    "/usr/lib/code-insiders/extensions",
    "/usr/share/code/resources/app/extensions",
    "/usr/share/code-insiders/resources/app/extensions",
    "/opt/visual-studio-code/resources/app/extensions",
    "/opt/visual-studio-code-insiders/resources/app/extensions",
    "/var/lib/snapd/snap/code/current/usr/share/code/resources/app/extensions",
    "/var/lib/snapd/snap/code-insiders/current/usr/share/code-insiders/resources/app/extensions",
];

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    contributes: Option<Contributions>,
}

#[derive(Debug, Default, Deserialize)]
struct Contributions {
    #[serde(default, alias = "Themes")]
    themes: Vec<ThemeContribution>,
}

#[derive(Debug, Deserialize)]
struct ThemeContribution {
    id: Option<String>,
    label: Option<String>,
}

impl ThemeContribution {
    /// The name the editor expects in `workbench.colorTheme`: the `id` when
    /// the manifest declares one, otherwise the `label`.
    fn into_entry(self) -> Option<(String, String)> {
        match (self.id, self.label) {
            (Some(id), label) => {
                let display = label.unwrap_or_else(|| id.clone());
                Some((id, display))
            }
            (None, Some(label)) => Some((label.clone(), label)),
            (None, None) => None,
        }
    }
}

pub struct VsCodeAdapter {
    paths: HostPaths,
}

impl VsCodeAdapter {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths }
    }

    /// `settings.json` candidates, first existing wins.
    pub fn settings_candidates(&self) -> Vec<PathBuf> {
        EDITOR_DIRS
            .iter()
            .map(|editor| self.paths.config_dir.join(editor).join("User/settings.json"))
            .collect()
    }

    fn extension_dirs(&self) -> Vec<PathBuf> {
        USER_EXTENSION_DIRS
            .iter()
            .map(|dir| self.paths.home.join(dir))
            .chain(SYSTEM_EXTENSION_DIRS.iter().map(|dir| self.paths.system(dir)))
            .collect()
    }
}

/// The top-level `package.json` of each extension directly under `dir`.
///
/// Only direct children are extensions; anything deeper (fixtures, vendored
/// packages) is not an installed theme.
fn find_manifests(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter(|entry| entry.file_name() != "node_modules")
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir() || t.is_symlink()))
        .map(|entry| entry.path().join("package.json"))
        .filter(|manifest| manifest.is_file())
        .collect()
}

fn read_manifest_themes(path: &Path) -> Vec<(String, String)> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    // Extensions ship plenty of package.json files that aren't manifests.
    let Ok(manifest) = serde_json::from_str::<Manifest>(&text) else {
        return Vec::new();
    };

    manifest
        .contributes
        .unwrap_or_default()
        .themes
        .into_iter()
        .filter_map(ThemeContribution::into_entry)
        .collect()
}

impl ThemeAdapter for VsCodeAdapter {
    fn id(&self) -> PluginId {
        PluginId::VsCode
    }

    fn available(&self) -> bool {
        EDITOR_DIRS
            .iter()
            .any(|editor| self.paths.config_dir.join(editor).is_dir())
    }

    fn available_themes(&self) -> Result<BTreeMap<String, String>, PluginError> {
        Ok(self
            .extension_dirs()
            .iter()
            .flat_map(|dir| find_manifests(dir))
            .flat_map(|path| read_manifest_themes(&path))
            .collect())
    }

    fn write_theme(&self, theme: &str) -> Result<PathBuf, PluginError> {
        let candidates = self.settings_candidates();
        let path = first_existing_file(&candidates).ok_or(PluginError::ConfigNotFound {
            plugin: PluginId::VsCode.display_name(),
        })?;

        let text = std::fs::read_to_string(&path).map_err(|e| PluginError::io(&path, e))?;
        let updated = json::set_top_level_key(&text, THEME_KEY, theme).map_err(|e| e.at(&path))?;

        write_atomic(&path, updated.as_bytes()).map_err(|e| PluginError::Write {
            path: crate::common::utils::private_path(&path),
            reason: format!("{e:#}"),
        })?;
        Ok(path)
    }
}
