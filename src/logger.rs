//! Structured logging with the box-drawing output style.
//!
//! Every component of yin-yang reports through the macros defined here so the
//! daemon, the toggle command and the theme listing share one visual stream.
//! Output goes to stdout by default; `Log::start_file_logging` reroutes it to
//! a file through a writer thread, which is how the background daemon keeps a
//! log when started with `--log`.
//!
//! Logging can be switched off at runtime, which tests use to stay quiet.

use std::io::Write;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

use crate::common::constants::LOG_MAX_BYTES;

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Set once when `--log` routes output to a file
static LOG_CHANNEL: OnceLock<Option<Sender<LogMessage>>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Main logging interface.
///
/// ## Logging Conventions
///
/// - **`log_block_start!`**: opens a new conceptual block ("Theme switched",
///   "Daemon armed"). Prints an empty pipe `┃` and then `┣ message`.
/// - **`log_decorated!`**: a line belonging to the current block, `┣ message`.
/// - **`log_indented!`**: nested detail under a block, `┃   message`.
/// - **`log_pipe!`**: a single `┃` spacer, used before `log_warning!`,
///   `log_error!`, `log_info!` or `log_debug!` when they begin a block.
/// - **`log_version!`** / **`log_end!`**: header and final marker of a run.
/// - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`**: semantic
///   messages with a colored `[LEVEL]` prefix.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Start file logging to the specified path.
    ///
    /// Consecutive daemon runs append to one log. Once it reaches
    /// [`LOG_MAX_BYTES`] it moves to `<file>.1` (replacing the previous
    /// backup) and a fresh file is started.
    pub fn start_file_logging(file_path: PathBuf) -> anyhow::Result<LoggerGuard> {
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(Some(tx.clone()))
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = RotatingFile::open(file_path, LOG_MAX_BYTES)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write(&text)?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Whether output is currently routed to a log file.
    pub fn is_file_logging() -> bool {
        matches!(LOG_CHANNEL.get(), Some(Some(_)))
    }

    /// Timestamp prefix for file output.
    ///
    /// Terminal output carries no timestamp; a daemon log file does, since
    /// nobody watches it live.
    pub fn get_timestamp_prefix() -> String {
        if Self::is_file_logging() {
            format!("[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Append-only log file with a single size-capped backup.
struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    file: File,
    written: u64,
}

impl RotatingFile {
    fn open(path: PathBuf, max_bytes: u64) -> std::io::Result<Self> {
        let existing = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if existing >= max_bytes {
            std::fs::rename(&path, backup_path(&path))?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            file,
            written,
        })
    }

    fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.file.write_all(text.as_bytes())?;
        self.file.flush()?;
        self.written += text.len() as u64;

        if self.written >= self.max_bytes {
            std::fs::rename(&self.path, backup_path(&self.path))?;
            self.file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.written = 0;
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".1");
    path.with_file_name(name)
}

/// Guard for file logging that flushes and joins the writer on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut rest = text;

    // Only SGR sequences (`ESC [ ... m`) are ever emitted.
    while let Some(start) = rest.find("\x1b[") {
        plain.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        rest = match after.find('m') {
            Some(end) => &after[end + 1..],
            None => "",
        };
    }
    plain.push_str(rest);
    plain
}

/// Send rendered text to stdout or to the log file writer.
pub fn write_output(text: &str) {
    if let Some(Some(tx)) = LOG_CHANNEL.get() {
        let clean_text = strip_ansi_codes(text);
        let _ = tx.send(LogMessage::Formatted(clean_text));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Shape of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Decorated,
    Indented,
    BlockStart,
    Info,
    Warning,
    Error,
    ErrorExit,
    Debug,
}

impl LineKind {
    fn render(self, prefix: &str, message: &str) -> String {
        match self {
            LineKind::Decorated => format!("{prefix}┣ {message}\n"),
            LineKind::Indented => format!("{prefix}┃   {message}\n"),
            LineKind::BlockStart => format!("{prefix}┃\n{prefix}┣ {message}\n"),
            LineKind::Info => format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
            LineKind::Warning => format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
            LineKind::Error => format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
            LineKind::ErrorExit => {
                format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n")
            }
            LineKind::Debug => format!("{prefix}┣[\x1b[36mDEBUG\x1b[0m] {message}\n"),
        }
    }
}

/// Render and route one line. Called by the logging macros.
pub fn emit(kind: LineKind, message: &str) {
    let prefix = Log::get_timestamp_prefix();
    write_output(&kind.render(&prefix, message));
}

/// Emit a fixed line with no message (pipe spacer, header, end marker).
pub fn emit_raw(text: &str) {
    let prefix = Log::get_timestamp_prefix();
    write_output(&format!("{prefix}{text}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(
            strip_ansi_codes("┣[\x1b[33mWARNING\x1b[0m] plugin failed"),
            "┣[WARNING] plugin failed"
        );
        assert_eq!(strip_ansi_codes("plain"), "plain");
    }

    #[test]
    fn test_line_shapes() {
        assert_eq!(LineKind::Decorated.render("", "hi"), "┣ hi\n");
        assert_eq!(LineKind::Indented.render("", "hi"), "┃   hi\n");
        assert_eq!(LineKind::BlockStart.render("", "hi"), "┃\n┣ hi\n");
        assert_eq!(
            strip_ansi_codes(&LineKind::ErrorExit.render("", "boom")),
            "┃\n┗[ERROR] boom\n"
        );
    }

    #[test]
    fn test_log_file_rotates_into_single_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yin_yang.log");

        let mut log = RotatingFile::open(path.clone(), 16).unwrap();
        log.write("first run line\n").unwrap();
        log.write("overflow\n").unwrap();
        log.write("fresh\n").unwrap();

        let backup = dir.path().join("yin_yang.log.1");
        assert_eq!(
            std::fs::read_to_string(&backup).unwrap(),
            "first run line\noverflow\n"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");

        // Crossing the cap again replaces the old backup instead of adding one.
        log.write("another long line\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(&backup).unwrap(),
            "fresh\nanother long line\n"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_full_log_is_rotated_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yin_yang.log");
        std::fs::write(&path, "x".repeat(32)).unwrap();

        let mut log = RotatingFile::open(path.clone(), 16).unwrap();
        log.write("new\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("yin_yang.log.1")).unwrap().len(),
            32
        );
    }

    #[test]
    fn test_no_timestamp_without_file_logging() {
        if !Log::is_file_logging() {
            assert!(Log::get_timestamp_prefix().is_empty());
        }
    }
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($kind:expr, $fmt:literal $($arg:tt)*) => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::emit($kind, &format!($fmt $($arg)*));
        }
    }};
    ($kind:expr, $expr:expr) => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::emit($kind, &$expr.to_string());
        }
    }};
}

/// Log a line that belongs to the current block: `┣ message`.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_line!($crate::logger::LineKind::Decorated, $($arg)+) };
}

/// Log a nested detail line: `┃   message`.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_line!($crate::logger::LineKind::Indented, $($arg)+) };
}

/// Open a new block: a spacer pipe followed by `┣ message`.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_line!($crate::logger::LineKind::BlockStart, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_line!($crate::logger::LineKind::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_line!($crate::logger::LineKind::Warning, $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_line!($crate::logger::LineKind::Error, $($arg)+) };
}

/// Log an error that ends the current flow: `┗[ERROR] message`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_line!($crate::logger::LineKind::ErrorExit, $($arg)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_line!($crate::logger::LineKind::Debug, $($arg)+) };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::emit_raw("┃");
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::emit_raw(concat!("┏ yin-yang v", env!("CARGO_PKG_VERSION"), " ━━╸"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::emit_raw("╹");
        }
    }};
}
