//! `yin-yang --schedule`: run the scheduling daemon in the foreground.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::common::constants::{CANCEL_POLL_INTERVAL, RETRY_BACKOFF};
use crate::config::{ConfigStore, start_config_watcher};
use crate::core::{DaemonExit, Scheduler, SchedulerParams};
use crate::io::lock::acquire_lock;
use crate::io::signals::setup_signal_handler;
use crate::plugins::{HostPaths, PluginRegistry};
use crate::time_source::RealTimeSource;

/// Start the daemon for whichever automatic mode is configured.
///
/// Returns immediately with [`DaemonExit::NothingScheduled`] when neither
/// mode is enabled. Otherwise takes the instance lock (stopping an older
/// daemon), wires up signals and the configuration watcher, and blocks until
/// the daemon is cancelled or signalled.
pub fn start_daemon(store: ConfigStore, paths: &HostPaths, debug_enabled: bool) -> Result<DaemonExit> {
    let config = store
        .load()
        .context("Failed to load configuration for the daemon")?;
    if !config.has_automatic_mode() {
        log_pipe!();
        log_warning!("Neither schedule nor follow_sun is enabled, nothing to do");
        return Ok(DaemonExit::NothingScheduled);
    }

    let _lock = acquire_lock(&store).context("Failed to acquire the instance lock")?;
    if debug_enabled {
        log_pipe!();
        log_debug!("Instance lock held by PID {}", std::process::id());
    }

    let signal_state = setup_signal_handler(debug_enabled)?;

    if let Err(e) =
        start_config_watcher(store.path().to_path_buf(), signal_state.sender(), debug_enabled)
    {
        log_pipe!();
        log_warning!("Configuration watcher unavailable: {e:#}");
        log_indented!(
            "Changes will be picked up within {}s",
            CANCEL_POLL_INTERVAL.as_secs()
        );
    }

    let registry = PluginRegistry::detect(paths, &config);

    Scheduler::new(SchedulerParams {
        store,
        registry,
        signal_state,
        time_source: Arc::new(RealTimeSource),
        debug_enabled,
        poll_interval: CANCEL_POLL_INTERVAL,
        retry_backoff: RETRY_BACKOFF,
    })
    .run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_manual_mode_returns_without_locking() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        let paths = HostPaths::under(dir.path());

        let exit = start_daemon(store.clone(), &paths, false).unwrap();

        assert_eq!(exit, DaemonExit::NothingScheduled);
        assert!(!store.load().unwrap().running);
    }
}
