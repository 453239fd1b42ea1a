//! Configuration sanity checks.
//!
//! Nothing here rejects a configuration: a settings editor may save half-done
//! edits, and the daemon must keep running through them. Problems are returned
//! as readable warnings; an unusable coordinate pair is handled later by the
//! trigger, which then makes no decision.

use chrono::Timelike;

use super::{ActivationMode, Config};
use crate::common::constants::TIME_FORMAT;

/// Describe everything questionable about `config`.
pub fn validate_config(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.schedule && config.follow_sun {
        warnings.push(
            "Both schedule and follow_sun are enabled; follow_sun takes priority".to_string(),
        );
    }

    if config.activation_mode() == ActivationMode::Schedule
        && config.start_time.hour() == config.end_time.hour()
        && config.start_time.minute() == config.end_time.minute()
    {
        warnings.push(format!(
            "start_time and end_time are both {}; the dark window is empty and light mode stays active",
            config.start_time.format(TIME_FORMAT)
        ));
    }

    if config.follow_sun {
        if !config.latitude.is_finite() || !(-90.0..=90.0).contains(&config.latitude) {
            warnings.push(format!(
                "latitude must be between -90 and 90 degrees (got {})",
                config.latitude
            ));
        }
        if !config.longitude.is_finite() || !(-180.0..=180.0).contains(&config.longitude) {
            warnings.push(format!(
                "longitude must be between -180 and 180 degrees (got {})",
                config.longitude
            ));
        }
    }

    if config.enabled_plugins.is_empty() {
        warnings.push("No plugins are enabled; only the stored theme will change".to_string());
    }

    warnings
}
