//! Deciding which theme should be active and when to decide again.
//!
//! Both automatic modes reduce to a window of light or dark time plus the
//! boundaries that delimit it. Windows are inclusive at the start and
//! exclusive at the end. The next wake-up is the nearest boundary strictly
//! after "now", looking at today's boundaries and the same boundaries shifted
//! by whole days.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::config::{ActivationMode, Config};
use crate::core::theme::ThemeState;
use crate::geo::SunTimes;

/// The outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub theme: ThemeState,
    /// Next moment the decision may change.
    pub next_wake: NaiveDateTime,
    pub mode: ActivationMode,
}

/// Whether `time` falls inside `[start, end)`, wrapping past midnight when
/// `end < start`. Equal bounds are an empty window.
pub fn is_time_in_window(time: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    use std::cmp::Ordering;

    match start.cmp(&end) {
        Ordering::Less => time >= start && time < end,
        Ordering::Greater => time >= start || time < end,
        Ordering::Equal => false,
    }
}

/// Nearest of `boundaries`, shifted by zero to two days, strictly after `now`.
fn next_boundary(now: NaiveDateTime, boundaries: &[NaiveDateTime]) -> NaiveDateTime {
    (0..=2)
        .flat_map(|days| boundaries.iter().map(move |b| *b + Duration::days(days)))
        .filter(|candidate| *candidate > now)
        .min()
        // Boundaries are never more than a day before now, so the two-day
        // shift always leaves a candidate.
        .unwrap_or(now + Duration::days(1))
}

fn decide_schedule(now: NaiveDateTime, config: &Config) -> Decision {
    let theme = if is_time_in_window(now.time(), config.start_time, config.end_time) {
        ThemeState::Dark
    } else {
        ThemeState::Light
    };

    let today = now.date();
    let boundaries = [
        today.and_time(config.start_time),
        today.and_time(config.end_time),
    ];

    Decision {
        theme,
        next_wake: next_boundary(now, &boundaries),
        mode: ActivationMode::Schedule,
    }
}

fn decide_follow_sun(now: NaiveDateTime, sun: &SunTimes) -> Decision {
    // Sun times computed for another day are moved onto today.
    let shift = now.date() - sun.date;
    let sunrise = sun.sunrise + shift;
    let sunset = sun.sunset + shift;

    let theme = if now >= sunrise && now < sunset {
        ThemeState::Light
    } else {
        ThemeState::Dark
    };

    Decision {
        theme,
        next_wake: next_boundary(now, &[sunrise, sunset]),
        mode: ActivationMode::FollowSun,
    }
}

/// Decide the theme for `now`.
///
/// Returns `None` when no automatic mode is enabled, or when follow-sun is
/// active without usable sun times.
pub fn decide(now: NaiveDateTime, config: &Config, sun: Option<&SunTimes>) -> Option<Decision> {
    match config.activation_mode() {
        ActivationMode::FollowSun => sun.map(|times| decide_follow_sun(now, times)),
        ActivationMode::Schedule => Some(decide_schedule(now, config)),
        ActivationMode::Manual => None,
    }
}
