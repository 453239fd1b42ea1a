//! The ordered set of plugins built at process start.

use super::gtk::GtkAdapter;
use super::konsole::KonsoleAdapter;
use super::kvantum::KvantumAdapter;
use super::vscode::VsCodeAdapter;
use super::{HostPaths, Plugin, PluginId, ThemeAdapter};
use crate::config::Config;

/// Create the adapter for `id`, resolving its files against `paths`.
pub fn create_adapter(id: PluginId, paths: &HostPaths) -> Box<dyn ThemeAdapter> {
    match id {
        PluginId::VsCode => Box::new(VsCodeAdapter::new(paths.clone())),
        PluginId::Gtk => Box::new(GtkAdapter::new(paths.clone())),
        PluginId::Kvantum => Box::new(KvantumAdapter::new(paths.clone())),
        PluginId::Konsole => Box::new(KonsoleAdapter::new(paths.clone())),
    }
}

/// Every supported plugin, in [`PluginId::ALL`] order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    pub fn new(plugins: Vec<Plugin>) -> Self {
        Self { plugins }
    }

    /// Build one plugin per supported application, configured from `config`.
    pub fn detect(paths: &HostPaths, config: &Config) -> Self {
        let plugins = PluginId::ALL
            .iter()
            .map(|&id| {
                Plugin::new(
                    create_adapter(id, paths),
                    config.is_plugin_enabled(id),
                    config.themes_for(id),
                )
            })
            .collect();
        Self { plugins }
    }

    /// Refresh enablement and theme names after the configuration changed.
    pub fn sync_with(&mut self, config: &Config) {
        for plugin in &mut self.plugins {
            let id = plugin.id();
            plugin.configure(config.is_plugin_enabled(id), config.themes_for(id));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }

    pub fn get(&self, id: PluginId) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.id() == id)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::ThemePair;
    use tempfile::tempdir;

    #[test]
    fn test_detect_builds_every_plugin_in_order() {
        let dir = tempdir().unwrap();
        let registry = PluginRegistry::detect(&HostPaths::under(dir.path()), &Config::default());

        let ids: Vec<PluginId> = registry.iter().map(Plugin::id).collect();
        assert_eq!(ids, PluginId::ALL.to_vec());
        assert!(registry.get(PluginId::VsCode).unwrap().is_enabled());
        assert!(!registry.get(PluginId::Konsole).unwrap().is_enabled());
    }

    #[test]
    fn test_sync_picks_up_config_changes() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        let mut registry = PluginRegistry::detect(&HostPaths::under(dir.path()), &config);

        config.enabled_plugins.insert(PluginId::Konsole);
        config
            .plugin_themes
            .insert(PluginId::Konsole, ThemePair::new("Solarized Light", "Solarized"));
        registry.sync_with(&config);

        let konsole = registry.get(PluginId::Konsole).unwrap();
        assert!(konsole.is_enabled());
        assert_eq!(konsole.themes().dark, "Solarized");
    }
}
