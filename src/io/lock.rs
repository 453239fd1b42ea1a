//! Single-instance enforcement for the daemon.
//!
//! The daemon holds an exclusive lock on `$XDG_RUNTIME_DIR/yin_yang.lock`
//! (falling back to `/tmp`). A daemon that finds the lock taken asks the
//! running one to stop by clearing `running` in the configuration, then waits
//! for the lock to be released.

use anyhow::{Result, bail};
use fs2::FileExt;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::common::constants::{INSTANCE_HANDOVER_TIMEOUT, INSTANCE_LOCK_NAME};
use crate::common::utils::private_path;
use crate::config::ConfigStore;

const RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Held for the daemon's lifetime; dropping it releases the lock.
#[derive(Debug)]
pub struct InstanceLock {
    _file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Default location of the instance lock.
pub fn default_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(INSTANCE_LOCK_NAME)
}

fn try_lock(path: &Path) -> Result<Option<File>> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(&file, "{}", std::process::id())?;
    file.flush()?;
    Ok(Some(file))
}

/// Acquire the instance lock at `path`, taking over from a running daemon.
pub fn acquire_lock_at(path: &Path, store: &ConfigStore, timeout: Duration) -> Result<InstanceLock> {
    if let Some(file) = try_lock(path)? {
        return Ok(InstanceLock {
            _file: file,
            path: path.to_path_buf(),
        });
    }

    log_pipe!();
    log_warning!("Another yin-yang daemon is running, asking it to stop");
    store.update(|config| config.running = false)?;

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        thread::sleep(RETRY_INTERVAL);
        if let Some(file) = try_lock(path)? {
            log_indented!("Previous daemon stopped");
            return Ok(InstanceLock {
                _file: file,
                path: path.to_path_buf(),
            });
        }
    }

    bail!(
        "Another daemon still holds {} after {}s",
        private_path(path),
        timeout.as_secs()
    )
}

/// Acquire the default instance lock.
pub fn acquire_lock(store: &ConfigStore) -> Result<InstanceLock> {
    acquire_lock_at(&default_lock_path(), store, INSTANCE_HANDOVER_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join("yin_yang.lock");
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        store.update(|c| c.running = true).unwrap();

        let first = acquire_lock_at(&lock_path, &store, Duration::from_secs(1)).unwrap();
        assert_eq!(first.path(), lock_path);

        let second = acquire_lock_at(&lock_path, &store, Duration::from_millis(300));
        assert!(second.is_err());
        // The contender asked the holder to stop.
        assert!(!store.load().unwrap().running);

        drop(first);
        assert!(acquire_lock_at(&lock_path, &store, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_lock_file_records_pid() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join("yin_yang.lock");
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));

        let _lock = acquire_lock_at(&lock_path, &store, Duration::from_secs(1)).unwrap();
        let content = std::fs::read_to_string(&lock_path).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }
}
