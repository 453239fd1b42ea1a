//! Sun position for the follow-sun mode.
//!
//! - [`solar`]: sunrise/sunset per day, with polar day and night sentinels
//!   and a per-day cache for the daemon
//!
//! Coordinates come straight from the configuration file, which may hold
//! anything a settings editor wrote. Bad coordinates are a [`GeoError`], and
//! the trigger treats them as "no decision" rather than failing the daemon.

pub mod solar;

use thiserror::Error;

pub use solar::{Daylight, SunCache, SunTimes, compute, compute_in};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error(
        "Invalid coordinates {latitude}, {longitude}: latitude must be within [-90, 90] and longitude within [-180, 180]"
    )]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Log computed sun times in debug mode.
pub fn log_sun_times(times: &SunTimes) {
    match times.daylight {
        Daylight::Regular => {
            log_debug!(
                "Sun times for {}: sunrise {}, sunset {}",
                times.date,
                times.sunrise.format("%H:%M"),
                times.sunset.format("%H:%M")
            );
        }
        Daylight::PolarDay => log_debug!("Polar day on {}: light all day", times.date),
        Daylight::PolarNight => log_debug!("Polar night on {}: dark all day", times.date),
    }
}
