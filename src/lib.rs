//! # yin-yang
//!
//! Switches desktop applications between a light and a dark theme, either on
//! a manual toggle, on a fixed daily schedule, or following local sunrise and
//! sunset.
//!
//! ## Architecture
//!
//! - **Configuration**: `config` owns the persisted JSON settings, with locked
//!   atomic updates shared by the CLI, the daemon and settings editors
//! - **Core**: `core` holds the theme state, the trigger that decides light or
//!   dark for a moment, the switcher, and the scheduling daemon
//! - **Geographic**: `geo` computes sunrise and sunset
//! - **Plugins**: `plugins` rewrites each application's own settings file
//! - **Commands**: `commands` implements the CLI actions parsed in `args`
//! - **Infrastructure**: signal handling and the instance lock in `io`,
//!   logging, and shared constants

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod geo;
pub mod io;
pub mod plugins;
pub mod time_source;
