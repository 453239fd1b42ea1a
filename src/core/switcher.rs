//! Applying a theme across every plugin.
//!
//! Plugins are applied one after the other. A failing plugin is recorded in
//! the [`Report`] and never stops the others, and the resolved theme is
//! persisted afterwards no matter how many plugins failed.

use std::fmt;

use crate::common::utils::private_path;
use crate::config::{ConfigError, ConfigStore};
use crate::core::theme::ThemeState;
use crate::plugins::{PluginId, PluginRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    Unavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => f.write_str("disabled"),
            SkipReason::Unavailable => f.write_str("not installed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginStatus {
    Applied,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOutcome {
    pub plugin_id: PluginId,
    pub plugin_name: &'static str,
    pub status: PluginStatus,
}

/// Per-plugin results of one [`ThemeSwitcher::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub theme: ThemeState,
    pub outcomes: Vec<PluginOutcome>,
}

impl Report {
    pub fn applied(&self) -> impl Iterator<Item = &PluginOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == PluginStatus::Applied)
    }

    pub fn failed(&self) -> impl Iterator<Item = &PluginOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PluginStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn status_of(&self, id: PluginId) -> Option<&PluginStatus> {
        self.outcomes
            .iter()
            .find(|o| o.plugin_id == id)
            .map(|o| &o.status)
    }

    /// One readable message covering every failed plugin, for manual toggles.
    pub fn failure_message(&self) -> Option<String> {
        let lines: Vec<String> = self
            .outcomes
            .iter()
            .filter_map(|o| match &o.status {
                PluginStatus::Failed(reason) => Some(format!("{}: {}", o.plugin_name, reason)),
                _ => None,
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    pub fn log(&self, debug_enabled: bool) {
        log_block_start!("Switched to {} theme", self.theme);
        for outcome in &self.outcomes {
            match &outcome.status {
                PluginStatus::Applied => log_indented!("{}: applied", outcome.plugin_name),
                PluginStatus::Skipped(reason) => {
                    if debug_enabled {
                        log_indented!("{}: skipped ({})", outcome.plugin_name, reason);
                    }
                }
                PluginStatus::Failed(reason) => {
                    log_warning!("{} failed: {}", outcome.plugin_name, reason);
                }
            }
        }
    }
}

/// Pushes a theme to every plugin and records it in the store.
pub struct ThemeSwitcher<'a> {
    store: &'a ConfigStore,
    debug_enabled: bool,
}

impl<'a> ThemeSwitcher<'a> {
    pub fn new(store: &'a ConfigStore, debug_enabled: bool) -> Self {
        Self {
            store,
            debug_enabled,
        }
    }

    /// Apply `theme` to every enabled, available plugin, then persist
    /// `dark_mode`.
    ///
    /// Only a failure to persist is an error; plugin failures are in the
    /// report.
    pub fn apply(&self, theme: ThemeState, registry: &PluginRegistry) -> Result<Report, ConfigError> {
        self.store.with_switch_lock(|| -> Result<Report, ConfigError> {
            let outcomes = self.apply_plugins(theme, registry);
            self.store.update(|config| config.dark_mode = theme.is_dark())?;
            Ok(Report { theme, outcomes })
        })?
    }

    /// Like [`Self::apply`], for the daemon: nothing is written once `running`
    /// has been cleared, so a manual toggle is never overwritten.
    ///
    /// Returns `None` when the switch was skipped.
    pub fn apply_if_running(
        &self,
        theme: ThemeState,
        registry: &PluginRegistry,
    ) -> Result<Option<Report>, ConfigError> {
        self.store.with_switch_lock(|| -> Result<Option<Report>, ConfigError> {
            if !self.store.load()?.running {
                return Ok(None);
            }

            let outcomes = self.apply_plugins(theme, registry);
            self.store.update(|config| {
                if config.running {
                    config.dark_mode = theme.is_dark();
                }
            })?;
            Ok(Some(Report { theme, outcomes }))
        })?
    }

    fn apply_plugins(&self, theme: ThemeState, registry: &PluginRegistry) -> Vec<PluginOutcome> {
        registry
            .iter()
            .map(|plugin| {
                let status = if !plugin.is_enabled() {
                    PluginStatus::Skipped(SkipReason::Disabled)
                } else if !plugin.available() {
                    PluginStatus::Skipped(SkipReason::Unavailable)
                } else {
                    match plugin.set_theme(plugin.theme_name(theme)) {
                        Ok(written) => {
                            if self.debug_enabled
                                && let Some(path) = written
                            {
                                log_debug!("{} wrote {}", plugin.name(), private_path(&path));
                            }
                            PluginStatus::Applied
                        }
                        Err(e) => PluginStatus::Failed(e.to_string()),
                    }
                };

                PluginOutcome {
                    plugin_id: plugin.id(),
                    plugin_name: plugin.name(),
                    status,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{HostPaths, Plugin, PluginError, ThemeAdapter, create_adapter};
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct BrokenAdapter;

    impl ThemeAdapter for BrokenAdapter {
        fn id(&self) -> PluginId {
            PluginId::Kvantum
        }
        fn available(&self) -> bool {
            true
        }
        fn available_themes(&self) -> Result<BTreeMap<String, String>, PluginError> {
            Ok(BTreeMap::new())
        }
        fn write_theme(&self, _theme: &str) -> Result<PathBuf, PluginError> {
            Err(PluginError::Write {
                path: "kvantum.kvconfig".into(),
                reason: "read-only file system".into(),
            })
        }
    }

    #[test]
    fn test_failures_are_isolated_and_theme_is_persisted() {
        let dir = tempdir().unwrap();
        let paths = HostPaths::under(dir.path());
        let gtk_dir = paths.config_dir.join("gtk-3.0");
        std::fs::create_dir_all(&gtk_dir).unwrap();
        std::fs::write(gtk_dir.join("settings.ini"), "[Settings]\n").unwrap();

        let registry = PluginRegistry::new(vec![
            Plugin::new(Box::new(BrokenAdapter), true, PluginId::Kvantum.default_themes()),
            Plugin::new(
                create_adapter(PluginId::Gtk, &paths),
                true,
                PluginId::Gtk.default_themes(),
            ),
            Plugin::new(
                create_adapter(PluginId::Konsole, &paths),
                false,
                PluginId::Konsole.default_themes(),
            ),
            Plugin::new(
                create_adapter(PluginId::VsCode, &paths),
                true,
                PluginId::VsCode.default_themes(),
            ),
        ]);
        let store = ConfigStore::new(dir.path().join("cfg/yin_yang.json"));

        let report = ThemeSwitcher::new(&store, false)
            .apply(ThemeState::Dark, &registry)
            .unwrap();

        assert!(matches!(
            report.status_of(PluginId::Kvantum),
            Some(PluginStatus::Failed(_))
        ));
        assert_eq!(report.status_of(PluginId::Gtk), Some(&PluginStatus::Applied));
        assert_eq!(
            report.status_of(PluginId::Konsole),
            Some(&PluginStatus::Skipped(SkipReason::Disabled))
        );
        assert_eq!(
            report.status_of(PluginId::VsCode),
            Some(&PluginStatus::Skipped(SkipReason::Unavailable))
        );
        assert!(report.has_failures());
        assert!(report.failure_message().unwrap().starts_with("Kvantum: "));
        assert!(store.load().unwrap().dark_mode);
        assert_eq!(
            std::fs::read_to_string(gtk_dir.join("settings.ini")).unwrap(),
            "[Settings]\ngtk-theme-name=Adwaita-dark\n"
        );
    }

    fn gtk_registry(paths: &HostPaths) -> PluginRegistry {
        PluginRegistry::new(vec![Plugin::new(
            create_adapter(PluginId::Gtk, paths),
            true,
            PluginId::Gtk.default_themes(),
        )])
    }

    #[test]
    fn test_daemon_switch_is_skipped_after_manual_toggle() {
        let dir = tempdir().unwrap();
        let paths = HostPaths::under(dir.path());
        let settings = paths.config_dir.join("gtk-3.0/settings.ini");
        std::fs::create_dir_all(settings.parent().unwrap()).unwrap();
        std::fs::write(&settings, "[Settings]\ngtk-theme-name=Adwaita\n").unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        // A toggle already cleared `running` and left the light theme.
        store
            .update(|c| {
                c.schedule = true;
                c.running = false;
                c.dark_mode = false;
            })
            .unwrap();

        let report = ThemeSwitcher::new(&store, false)
            .apply_if_running(ThemeState::Dark, &gtk_registry(&paths))
            .unwrap();

        assert_eq!(report, None);
        assert!(!store.load().unwrap().dark_mode);
        assert_eq!(
            std::fs::read_to_string(&settings).unwrap(),
            "[Settings]\ngtk-theme-name=Adwaita\n"
        );
    }

    #[test]
    fn test_daemon_switch_applies_while_running() {
        let dir = tempdir().unwrap();
        let paths = HostPaths::under(dir.path());
        let settings = paths.config_dir.join("gtk-3.0/settings.ini");
        std::fs::create_dir_all(settings.parent().unwrap()).unwrap();
        std::fs::write(&settings, "[Settings]\n").unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        store
            .update(|c| {
                c.schedule = true;
                c.running = true;
            })
            .unwrap();

        let report = ThemeSwitcher::new(&store, false)
            .apply_if_running(ThemeState::Dark, &gtk_registry(&paths))
            .unwrap()
            .unwrap();

        assert_eq!(report.status_of(PluginId::Gtk), Some(&PluginStatus::Applied));
        assert!(store.load().unwrap().dark_mode);
        assert!(
            std::fs::read_to_string(&settings)
                .unwrap()
                .contains("gtk-theme-name=Adwaita-dark")
        );
    }

    #[test]
    fn test_empty_registry_still_persists() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        store.update(|c| c.dark_mode = true).unwrap();

        let report = ThemeSwitcher::new(&store, false)
            .apply(ThemeState::Light, &PluginRegistry::default())
            .unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(report.failure_message(), None);
        assert!(!store.load().unwrap().dark_mode);
    }
}
