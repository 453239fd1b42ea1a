//! yin-yang command-line entry point.
//!
//! Parses arguments, resolves the configuration store and hands off to one of
//! the command handlers. Everything else lives in the library.

use anyhow::{Context, Result};

use yin_yang::args::{self, CliAction, ParsedArgs};
use yin_yang::commands;
use yin_yang::common::constants::{EXIT_FAILURE, EXIT_SUCCESS, LOG_FILE_NAME};
use yin_yang::common::utils::private_path;
use yin_yang::config::{self, Config, ConfigStore, validate_config};
use yin_yang::logger::Log;
use yin_yang::plugins::{HostPaths, PluginRegistry};
use yin_yang::{log_block_start, log_debug, log_end, log_error_exit, log_indented, log_info};
use yin_yang::{log_pipe, log_version, log_warning};

fn main() {
    let parsed = ParsedArgs::from_env();

    let code = match parsed.action {
        CliAction::ShowHelp => {
            args::display_help();
            EXIT_SUCCESS
        }
        CliAction::ShowVersion => {
            args::display_version_info();
            EXIT_SUCCESS
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            EXIT_FAILURE
        }
        CliAction::Toggle {
            debug_enabled,
            config_dir,
        } => report(run_toggle(debug_enabled, config_dir)),
        CliAction::Schedule {
            debug_enabled,
            config_dir,
            log_to_file,
        } => report(run_schedule(debug_enabled, config_dir, log_to_file)),
        CliAction::Themes {
            debug_enabled,
            config_dir,
        } => report(run_themes(debug_enabled, config_dir)),
    };

    std::process::exit(code);
}

fn report(result: Result<()>) -> i32 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            log_error_exit!("{e:#}");
            EXIT_FAILURE
        }
    }
}

/// Resolve the store, load it once and print any validation warnings.
fn open_store(debug_enabled: bool, config_dir: Option<String>) -> Result<(ConfigStore, Config)> {
    config::set_config_dir(config_dir)?;
    let store = ConfigStore::open_default().context("Failed to locate configuration")?;
    let config = store.load().context("Failed to load configuration")?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Debug mode enabled");
        config.log_config(&private_path(store.path()));
    }

    let warnings = validate_config(&config);
    if !warnings.is_empty() {
        log_pipe!();
        for warning in &warnings {
            log_warning!("{warning}");
        }
    }

    Ok((store, config))
}

fn run_toggle(debug_enabled: bool, config_dir: Option<String>) -> Result<()> {
    log_version!();
    let (store, config) = open_store(debug_enabled, config_dir)?;
    let mut registry = PluginRegistry::detect(&HostPaths::detect(), &config);

    commands::toggle(&store, &mut registry, debug_enabled)?;
    log_end!();
    Ok(())
}

fn run_schedule(debug_enabled: bool, config_dir: Option<String>, log_to_file: bool) -> Result<()> {
    let _log_guard = if log_to_file {
        let data_dir = dirs::data_dir().context("Could not determine the data directory")?;
        let log_path = data_dir.join(LOG_FILE_NAME);
        let guard = Log::start_file_logging(log_path.clone())
            .with_context(|| format!("Failed to open {}", private_path(&log_path)))?;
        Some(guard)
    } else {
        None
    };

    log_version!();
    let (store, _) = open_store(debug_enabled, config_dir)?;
    let exit = commands::start_daemon(store, &HostPaths::detect(), debug_enabled)?;

    if debug_enabled {
        log_pipe!();
        log_info!("Daemon finished: {exit}");
    }
    log_end!();
    Ok(())
}

fn run_themes(debug_enabled: bool, config_dir: Option<String>) -> Result<()> {
    log_version!();
    let (_, config) = open_store(debug_enabled, config_dir)?;
    let registry = PluginRegistry::detect(&HostPaths::detect(), &config);

    log_block_start!("Installed themes");
    log_indented!("Configured pairs are listed first for each plugin");
    let errors = commands::list_themes(&registry);
    if errors > 0 {
        anyhow::bail!("{errors} plugin(s) could not list their themes");
    }
    Ok(())
}
