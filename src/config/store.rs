//! Locked, atomic access to the configuration file.
//!
//! The command line, the daemon and a settings editor may all touch the file
//! at once. Every read takes a shared `fs2` lock and every read-modify-write
//! an exclusive one, both on a sidecar `<file>.lock` so the lock survives the
//! rename that replaces the configuration file itself.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use super::{Config, ConfigError, get_config_path};
use crate::common::utils::{private_path, write_atomic};

/// Handle on one configuration file. Cheap to clone, holds no open files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default (or `--config` overridden) location.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(get_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the configuration.
    ///
    /// A missing or empty file is created with defaults.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let existing = {
            let lock = self.open_lock()?;
            FileExt::lock_shared(&lock).map_err(|e| self.lock_error(e))?;
            self.read_unlocked()?
        };

        match existing {
            Some(config) => Ok(config),
            None => self.update(|_| {}),
        }
    }

    /// Apply `mutate` to the current configuration and persist the result.
    ///
    /// Runs under the exclusive lock, so concurrent updates from other
    /// processes are never lost. Returns the configuration as written.
    pub fn update<F>(&self, mutate: F) -> Result<Config, ConfigError>
    where
        F: FnOnce(&mut Config),
    {
        let lock = self.open_lock()?;
        FileExt::lock_exclusive(&lock).map_err(|e| self.lock_error(e))?;

        let mut config = self.read_unlocked()?.unwrap_or_default();
        mutate(&mut config);
        self.write_unlocked(&config)?;
        Ok(config)
    }

    /// Replace the whole configuration.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let replacement = config.clone();
        self.update(move |current| *current = replacement).map(|_| ())
    }

    /// Whether a daemon is marked as running.
    pub fn is_running(&self) -> Result<bool, ConfigError> {
        self.load().map(|config| config.running)
    }

    /// Run `switch` while holding the theme-switch lock.
    ///
    /// Applying a theme spans many files plus the final `dark_mode` write.
    /// This lock keeps a manual toggle and the daemon from interleaving those
    /// writes. It is separate from the configuration lock, which `switch` is
    /// free to take.
    pub fn with_switch_lock<T>(&self, switch: impl FnOnce() -> T) -> Result<T, ConfigError> {
        let lock = self.open_sidecar(".switch.lock")?;
        FileExt::lock_exclusive(&lock).map_err(|e| self.lock_error(e))?;
        Ok(switch())
    }

    fn sidecar_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn open_lock(&self) -> Result<File, ConfigError> {
        self.open_sidecar(".lock")
    }

    fn open_sidecar(&self, suffix: &str) -> Result<File, ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.lock_error(e))?;
        }

        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.sidecar_path(suffix))
            .map_err(|e| self.lock_error(e))
    }

    fn read_unlocked(&self) -> Result<Option<Config>, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: private_path(&self.path),
                    source,
                });
            }
        };

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: private_path(&self.path),
                source,
            })
    }

    fn write_unlocked(&self, config: &Config) -> Result<(), ConfigError> {
        let mut text = serde_json::to_string_pretty(config).map_err(|e| ConfigError::Write {
            path: private_path(&self.path),
            message: e.to_string(),
        })?;
        text.push('\n');

        write_atomic(&self.path, text.as_bytes()).map_err(|e| ConfigError::Write {
            path: private_path(&self.path),
            message: format!("{e:#}"),
        })
    }

    fn lock_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Lock {
            path: private_path(&self.sidecar_path(".lock")),
            source,
        }
    }
}
