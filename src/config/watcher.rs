//! Wake the daemon when the configuration file changes.
//!
//! Settings editors and `--toggle` rewrite the file; without the watcher the
//! daemon would only notice on its next poll. The configuration directory is
//! watched rather than the file because every write replaces the file through
//! a rename.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use crate::common::constants::WATCHER_DEBOUNCE;
use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Whether `event` touched the watched configuration file.
fn affects(event: &Event, config_path: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == config_path.file_name())
}

/// Watch `config_path` and send [`SignalMessage::ConfigChanged`] on changes.
///
/// The watcher lives on a background thread until the receiving end of
/// `signal_sender` is dropped.
pub fn start_config_watcher(
    config_path: PathBuf,
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    let dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .context("Configuration path has no parent directory")?;

    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )
    .context("Failed to create file watcher")?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", private_path(&dir)))?;

    if debug_enabled {
        log_debug!("Watching {} for changes", private_path(&config_path));
    }

    thread::spawn(move || {
        // Dropping the watcher stops event delivery.
        let _watcher = watcher;
        let mut last_sent: Option<Instant> = None;

        for event in rx {
            if !affects(&event, &config_path) {
                continue;
            }
            if last_sent.is_some_and(|t| t.elapsed() < WATCHER_DEBOUNCE) {
                continue;
            }

            if debug_enabled {
                log_debug!("Configuration file change detected");
            }
            if signal_sender.send(SignalMessage::ConfigChanged).is_err() {
                break;
            }
            last_sent = Some(Instant::now());
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_only_config_file_events_count() {
        let config = Path::new("/cfg/yin_yang/yin_yang.json");

        assert!(affects(
            &event(EventKind::Modify(ModifyKind::Any), "/cfg/yin_yang/yin_yang.json"),
            config
        ));
        assert!(affects(
            &event(EventKind::Create(CreateKind::File), "/cfg/yin_yang/yin_yang.json"),
            config
        ));
        assert!(!affects(
            &event(EventKind::Modify(ModifyKind::Any), "/cfg/yin_yang/yin_yang.json.lock"),
            config
        ));
        assert!(!affects(
            &event(EventKind::Access(notify::event::AccessKind::Any), "/cfg/yin_yang/yin_yang.json"),
            config
        ));
    }
}
