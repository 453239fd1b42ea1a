//! Application-wide constants and defaults.

use std::time::Duration;

// # Paths

/// Directory name under the XDG config home holding the configuration.
pub const CONFIG_DIR_NAME: &str = "yin_yang";

/// Configuration file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "yin_yang.json";

/// Log file written under the XDG data home when `--log` is given.
pub const LOG_FILE_NAME: &str = "yin_yang.log";

/// Size at which the log file moves to `<file>.1`.
pub const LOG_MAX_BYTES: u64 = 1_000_000_000;

/// Instance lock file placed in the runtime directory.
pub const INSTANCE_LOCK_NAME: &str = "yin_yang.lock";

// # Configuration defaults

/// Moment dark mode begins in fixed-schedule mode (HH:MM).
pub const DEFAULT_DARK_START: (u32, u32) = (20, 0);

/// Moment dark mode ends in fixed-schedule mode (HH:MM).
pub const DEFAULT_DARK_END: (u32, u32) = (7, 0);

pub const DEFAULT_LATITUDE: f64 = 0.0;
pub const DEFAULT_LONGITUDE: f64 = 0.0;

/// Serialization format of time-of-day values in the configuration file.
pub const TIME_FORMAT: &str = "%H:%M";

// # Daemon timing

/// Wait after a failed scheduling iteration before trying again.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Upper bound between two checks of the persisted `running` flag while sleeping.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long a new daemon waits for a previous one to release the instance lock.
pub const INSTANCE_HANDOVER_TIMEOUT: Duration = Duration::from_secs(10);

/// Debounce for configuration file change events.
pub const WATCHER_DEBOUNCE: Duration = Duration::from_millis(300);

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
