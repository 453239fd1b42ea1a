//! Manual toggle: flip the theme now.
//!
//! A manual toggle is the user taking over, so it also turns both automatic
//! modes off and clears `running`. A sleeping daemon notices the cleared flag
//! (or the file change) and terminates on its own.

use anyhow::{Context, Result, anyhow};

use crate::config::ConfigStore;
use crate::core::switcher::{Report, ThemeSwitcher};
use crate::plugins::PluginRegistry;

/// Flip the persisted theme and apply it to every plugin.
///
/// Plugin failures do not stop the switch. They come back as one error whose
/// message names every failed plugin, after `dark_mode` has been persisted.
pub fn toggle(
    store: &ConfigStore,
    registry: &mut PluginRegistry,
    debug_enabled: bool,
) -> Result<Report> {
    let config = store
        .update(|config| config.clear_automatic_modes())
        .context("Failed to update configuration for the toggle")?;

    let target = config.theme().toggled();
    if debug_enabled {
        log_pipe!();
        log_debug!("Toggling from {} to {}", config.theme(), target);
    }

    registry.sync_with(&config);
    let report = ThemeSwitcher::new(store, debug_enabled)
        .apply(target, registry)
        .context("Failed to persist the new theme")?;
    report.log(debug_enabled);

    match report.failure_message() {
        Some(message) => Err(anyhow!(message)),
        None => Ok(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::theme::ThemeState;
    use crate::plugins::{HostPaths, PluginId};
    use tempfile::tempdir;

    fn gtk_home(root: &std::path::Path) -> HostPaths {
        let paths = HostPaths::under(root);
        let gtk_dir = paths.config_dir.join("gtk-3.0");
        std::fs::create_dir_all(&gtk_dir).unwrap();
        std::fs::write(gtk_dir.join("settings.ini"), "[Settings]\ngtk-theme-name=Adwaita\n")
            .unwrap();
        paths
    }

    #[test]
    fn test_toggle_flips_theme_and_clears_modes() {
        let dir = tempdir().unwrap();
        let paths = gtk_home(dir.path());
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        let config = store
            .update(|c| {
                c.schedule = true;
                c.follow_sun = true;
                c.running = true;
            })
            .unwrap();
        let mut registry = PluginRegistry::detect(&paths, &config);

        let report = toggle(&store, &mut registry, false).unwrap();

        assert_eq!(report.theme, ThemeState::Dark);
        let saved = store.load().unwrap();
        assert!(saved.dark_mode);
        assert!(!saved.running);
        assert!(!saved.schedule);
        assert!(!saved.follow_sun);

        let settings =
            std::fs::read_to_string(paths.config_dir.join("gtk-3.0/settings.ini")).unwrap();
        assert!(settings.contains("gtk-theme-name=Adwaita-dark"));
    }

    #[test]
    fn test_toggle_twice_returns_to_light() {
        let dir = tempdir().unwrap();
        let paths = gtk_home(dir.path());
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        let config = store.load().unwrap();
        let mut registry = PluginRegistry::detect(&paths, &config);

        toggle(&store, &mut registry, false).unwrap();
        let report = toggle(&store, &mut registry, false).unwrap();

        assert_eq!(report.theme, ThemeState::Light);
        assert!(!store.load().unwrap().dark_mode);
    }

    #[test]
    fn test_toggle_reports_plugin_failure_but_persists() {
        let dir = tempdir().unwrap();
        // VS Code is installed but has never written a settings file.
        let paths = HostPaths::under(dir.path());
        std::fs::create_dir_all(paths.config_dir.join("Code")).unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        let config = store
            .update(|c| {
                c.enabled_plugins = [PluginId::VsCode].into_iter().collect();
            })
            .unwrap();
        let mut registry = PluginRegistry::detect(&paths, &config);

        let err = toggle(&store, &mut registry, false).unwrap_err();

        assert!(err.to_string().starts_with("VS Code: "));
        assert!(err.to_string().contains("manually once"));
        assert!(store.load().unwrap().dark_mode);
    }
}
