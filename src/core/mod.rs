//! The scheduling daemon.
//!
//! The [`Scheduler`] repeats one cycle until it is cancelled:
//!
//! 1. **Armed**: re-read the configuration, refresh sun times when needed and
//!    ask the [`trigger`] for the desired theme and the next boundary
//! 2. apply the theme through the [`switcher`] when it differs from the last
//!    one applied (the first decision always applies)
//! 3. **Sleeping**: block on the signal channel until the boundary, a wake-up
//!    message, a shutdown signal, or `running` being cleared in the store
//!
//! The sleep never blocks longer than the poll interval at a time, which
//! bounds how late a cancellation through the store is noticed. Errors inside
//! one cycle are logged and retried after a fixed backoff; they never end the
//! daemon.

pub mod switcher;
pub mod theme;
pub mod trigger;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::common::constants::TIME_FORMAT;
use crate::config::{ActivationMode, Config, ConfigError, ConfigStore};
use crate::core::switcher::ThemeSwitcher;
use crate::core::theme::ThemeState;
use crate::core::trigger::decide;
use crate::geo::{self, SunCache, SunTimes};
use crate::io::signals::{SignalMessage, SignalState};
use crate::plugins::PluginRegistry;
use crate::time_source::TimeSource;

/// Everything a [`Scheduler`] needs.
pub struct SchedulerParams {
    pub store: ConfigStore,
    pub registry: PluginRegistry,
    pub signal_state: SignalState,
    pub time_source: Arc<dyn TimeSource>,
    pub debug_enabled: bool,
    /// Longest single blocking wait; bounds cancellation latency.
    pub poll_interval: Duration,
    /// Wait after a failed or undecidable cycle.
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Idle,
    Armed,
    Sleeping,
    Terminated,
}

/// Why the daemon stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonExit {
    /// Neither automatic mode was enabled at start.
    NothingScheduled,
    /// `running` was cleared or both modes were turned off.
    Cancelled,
    /// A termination signal arrived.
    Shutdown,
}

impl fmt::Display for DaemonExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DaemonExit::NothingScheduled => "nothing scheduled",
            DaemonExit::Cancelled => "cancelled",
            DaemonExit::Shutdown => "shutdown signal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WakeReason {
    Timer,
    Reevaluate,
    Cancelled,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    SleepUntil(NaiveDateTime),
    Stop(DaemonExit),
}

pub struct Scheduler {
    store: ConfigStore,
    registry: PluginRegistry,
    signal_state: SignalState,
    time_source: Arc<dyn TimeSource>,
    debug_enabled: bool,
    poll_interval: Duration,
    retry_backoff: Duration,
    state: DaemonState,
    last_applied: Option<ThemeState>,
    armed_until: Option<NaiveDateTime>,
    sun_cache: SunCache,
}

impl Scheduler {
    pub fn new(params: SchedulerParams) -> Self {
        Self {
            store: params.store,
            registry: params.registry,
            signal_state: params.signal_state,
            time_source: params.time_source,
            debug_enabled: params.debug_enabled,
            poll_interval: params.poll_interval,
            retry_backoff: params.retry_backoff,
            state: DaemonState::Idle,
            last_applied: None,
            armed_until: None,
            sun_cache: SunCache::new(),
        }
    }

    pub fn state(&self) -> DaemonState {
        self.state
    }

    /// Run until cancelled.
    pub fn run(mut self) -> Result<DaemonExit> {
        let config = self
            .store
            .load()
            .context("Failed to load configuration for the daemon")?;

        if !config.has_automatic_mode() {
            log_pipe!();
            log_warning!("Neither schedule nor follow_sun is enabled, nothing to do");
            self.state = DaemonState::Terminated;
            return Ok(DaemonExit::NothingScheduled);
        }

        self.store
            .update(|c| c.running = true)
            .context("Failed to mark the daemon as running")?;
        log_block_start!(
            "Daemon started in {} mode",
            config.activation_mode().as_str()
        );

        let exit = loop {
            self.state = DaemonState::Armed;
            let step = match self.arm() {
                Ok(step) => step,
                Err(e) => {
                    log_pipe!();
                    log_error!("Scheduling failed: {e}");
                    log_indented!("Retrying in {}s", self.retry_backoff.as_secs());
                    self.armed_until = None;
                    Step::SleepUntil(self.time_source.now() + self.backoff_delta())
                }
            };

            let deadline = match step {
                Step::Stop(exit) => break exit,
                Step::SleepUntil(deadline) => deadline,
            };

            self.state = DaemonState::Sleeping;
            match self.wait_until(deadline) {
                WakeReason::Timer | WakeReason::Reevaluate => continue,
                WakeReason::Cancelled => break DaemonExit::Cancelled,
                WakeReason::Shutdown => break DaemonExit::Shutdown,
            }
        };

        self.state = DaemonState::Terminated;
        if let Err(e) = self.store.update(|c| c.running = false) {
            log_warning!("Failed to clear the running flag: {e}");
        }
        log_block_start!("Daemon stopped: {}", exit);
        Ok(exit)
    }

    fn backoff_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.retry_backoff).unwrap_or(TimeDelta::minutes(1))
    }

    /// One Armed step: decide, apply if needed, and pick the next deadline.
    fn arm(&mut self) -> Result<Step, ConfigError> {
        let config = self.store.load()?;
        if !config.running {
            if self.debug_enabled {
                log_debug!("Running flag cleared, stopping");
            }
            return Ok(Step::Stop(DaemonExit::Cancelled));
        }
        if !config.has_automatic_mode() {
            log_pipe!();
            log_info!("Automatic mode turned off, stopping");
            return Ok(Step::Stop(DaemonExit::Cancelled));
        }

        self.registry.sync_with(&config);
        let now = self.time_source.now();
        let sun = self.sun_times(now.date(), &config);

        let Some(decision) = decide(now, &config, sun.as_ref()) else {
            log_warning!(
                "Unable to decide a theme, retrying in {}s",
                self.retry_backoff.as_secs()
            );
            self.armed_until = None;
            return Ok(Step::SleepUntil(now + self.backoff_delta()));
        };

        if self.last_applied != Some(decision.theme) {
            let Some(report) = ThemeSwitcher::new(&self.store, self.debug_enabled)
                .apply_if_running(decision.theme, &self.registry)?
            else {
                if self.debug_enabled {
                    log_debug!("Running flag cleared before switching, stopping");
                }
                return Ok(Step::Stop(DaemonExit::Cancelled));
            };
            report.log(self.debug_enabled);
            self.last_applied = Some(decision.theme);
        }

        if self.armed_until != Some(decision.next_wake) {
            log_decorated!(
                "Next change at {}",
                decision.next_wake.format(&format!("%Y-%m-%d {TIME_FORMAT}"))
            );
            self.armed_until = Some(decision.next_wake);
        }

        Ok(Step::SleepUntil(decision.next_wake))
    }

    fn sun_times(&mut self, date: NaiveDate, config: &Config) -> Option<SunTimes> {
        if config.activation_mode() != ActivationMode::FollowSun {
            return None;
        }

        let refresh = self
            .sun_cache
            .is_stale(date, config.latitude, config.longitude);
        match self.sun_cache.get(date, config.latitude, config.longitude) {
            Ok(times) => {
                if refresh && self.debug_enabled {
                    geo::log_sun_times(&times);
                }
                Some(times)
            }
            Err(e) => {
                log_warning!("{e}");
                None
            }
        }
    }

    /// Whether `running` has been cleared in the store.
    fn cancel_requested(&self) -> bool {
        match self.store.load() {
            Ok(config) => !config.running,
            Err(e) => {
                if self.debug_enabled {
                    log_debug!("Could not check the running flag: {e}");
                }
                false
            }
        }
    }

    /// Block until `deadline` or until something interrupts the sleep.
    fn wait_until(&self, deadline: NaiveDateTime) -> WakeReason {
        loop {
            if !self.signal_state.is_running() {
                return WakeReason::Shutdown;
            }

            // Re-read the clock every chunk so suspend and clock changes
            // are caught within one poll interval.
            let remaining = match (deadline - self.time_source.now()).to_std() {
                Ok(remaining) if !remaining.is_zero() => remaining,
                _ => return WakeReason::Timer,
            };
            let chunk = remaining.min(self.poll_interval);

            match self.signal_state.signal_receiver.recv_timeout(chunk) {
                Ok(SignalMessage::Shutdown) => return WakeReason::Shutdown,
                Ok(SignalMessage::Wake) | Ok(SignalMessage::ConfigChanged) => {
                    return WakeReason::Reevaluate;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.cancel_requested() {
                        return WakeReason::Cancelled;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(chunk);
                    if self.cancel_requested() {
                        return WakeReason::Cancelled;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_source::FixedTimeSource;
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::tempdir;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 19)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn scheduler(store: ConfigStore, now: NaiveDateTime) -> Scheduler {
        Scheduler::new(SchedulerParams {
            store,
            registry: PluginRegistry::default(),
            signal_state: SignalState::new(),
            time_source: Arc::new(FixedTimeSource::new(now)),
            debug_enabled: false,
            poll_interval: Duration::from_millis(20),
            retry_backoff: Duration::from_secs(60),
        })
    }

    #[test]
    fn test_manual_mode_terminates_immediately() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));

        let exit = scheduler(store.clone(), at(12, 0)).run().unwrap();

        assert_eq!(exit, DaemonExit::NothingScheduled);
        assert!(!store.load().unwrap().running);
    }

    #[test]
    fn test_first_arm_applies_and_sleeps_until_boundary() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        store
            .update(|c| {
                c.schedule = true;
                c.running = true;
            })
            .unwrap();

        let mut daemon = scheduler(store.clone(), at(23, 0));
        let step = daemon.arm().unwrap();

        assert_eq!(step, Step::SleepUntil(at(7, 0) + TimeDelta::days(1)));
        assert_eq!(daemon.last_applied, Some(ThemeState::Dark));
        assert!(store.load().unwrap().dark_mode);
    }

    #[test]
    fn test_arm_stops_when_running_is_cleared() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        store.update(|c| c.schedule = true).unwrap();

        let mut daemon = scheduler(store, at(23, 0));
        assert_eq!(daemon.arm().unwrap(), Step::Stop(DaemonExit::Cancelled));
    }

    #[test]
    fn test_bad_coordinates_back_off() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        store
            .update(|c| {
                c.follow_sun = true;
                c.running = true;
                c.latitude = 123.0;
            })
            .unwrap();

        let mut daemon = scheduler(store, at(12, 0));
        assert_eq!(
            daemon.arm().unwrap(),
            Step::SleepUntil(at(12, 0) + TimeDelta::minutes(1))
        );
        assert_eq!(daemon.last_applied, None);
    }

    #[test]
    fn test_wait_wakes_on_messages() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        store.update(|c| c.running = true).unwrap();
        let daemon = scheduler(store, at(12, 0));

        daemon.signal_state.sender().send(SignalMessage::Wake).unwrap();
        assert_eq!(daemon.wait_until(at(13, 0)), WakeReason::Reevaluate);

        daemon
            .signal_state
            .sender()
            .send(SignalMessage::Shutdown)
            .unwrap();
        assert_eq!(daemon.wait_until(at(13, 0)), WakeReason::Shutdown);
    }

    #[test]
    fn test_wait_notices_cancellation_through_the_store() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        store.update(|c| c.running = false).unwrap();
        let daemon = scheduler(store, at(12, 0));

        assert_eq!(daemon.wait_until(at(13, 0)), WakeReason::Cancelled);
    }

    #[test]
    fn test_wait_returns_at_past_deadline() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("yin_yang.json"));
        let daemon = scheduler(store, at(12, 0));

        assert_eq!(daemon.wait_until(at(11, 0)), WakeReason::Timer);
    }
}
