//! `yin-yang themes`: list what each plugin can switch to.

use crate::plugins::{PluginError, PluginRegistry};

/// Print every plugin's installed themes with the configured pair.
///
/// Returns how many plugins had a listing error other than "not installed"
/// or "nothing found".
pub fn list_themes(registry: &PluginRegistry) -> usize {
    let mut errors = 0;

    for plugin in registry.iter() {
        let state = if plugin.is_enabled() { "enabled" } else { "disabled" };
        log_block_start!("{} ({})", plugin.name(), state);

        if !plugin.available() {
            log_indented!("not installed");
            continue;
        }

        log_indented!(
            "light: {}, dark: {}",
            plugin.themes().light,
            plugin.themes().dark
        );

        match plugin.available_themes() {
            Ok(themes) => {
                for (id, display) in &themes {
                    if id == display {
                        log_indented!("  {}", id);
                    } else {
                        log_indented!("  {} ({})", id, display);
                    }
                }
            }
            Err(e @ PluginError::NoThemesFound { .. }) => log_warning!("{e}"),
            Err(e) => {
                log_error!("{e}");
                errors += 1;
            }
        }
    }

    log_end!();
    errors
}
