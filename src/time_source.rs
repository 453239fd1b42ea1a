//! Time source abstraction for the daemon.
//!
//! The scheduler asks a [`TimeSource`] for "now" instead of the system clock,
//! so tests can pin the wall clock to a chosen moment while the daemon still
//! waits on real timers.

use chrono::{Local, NaiveDateTime};

/// Source of the local wall-clock time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The host's local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Debug)]
pub struct FixedTimeSource {
    now: std::sync::Mutex<NaiveDateTime>,
}

#[cfg(any(test, feature = "testing-support"))]
impl FixedTimeSource {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for FixedTimeSource {
    fn now(&self) -> NaiveDateTime {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_fixed_source_moves_only_when_told() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let clock = FixedTimeSource::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::hours(8));
        assert_eq!(clock.now(), start + Duration::hours(8));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_real_source_tracks_local_clock() {
        let before = Local::now().naive_local();
        let now = RealTimeSource.now();
        assert!(now >= before);
    }
}
