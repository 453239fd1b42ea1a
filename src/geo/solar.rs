//! Sunrise and sunset for a date and a coordinate pair.
//!
//! Event times come from the `sunrise` crate and are converted to the wall
//! clock of a time zone, so they compare directly with the daemon's local
//! "now". Above the polar circles the sun may not cross the horizon at all;
//! those days are reported as sentinel ranges instead of errors:
//!
//! - polar day: `[00:00, next 00:00)`, light all day
//! - polar night: an empty range at `00:00`, dark all day

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::GeoError;

/// Whether the sun rises and sets on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Daylight {
    Regular,
    PolarDay,
    PolarNight,
}

/// Sunrise and sunset of one calendar day, as local wall-clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunTimes {
    pub date: NaiveDate,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
    pub daylight: Daylight,
}

impl SunTimes {
    fn polar(date: NaiveDate, daylight: Daylight) -> Self {
        let midnight = date.and_time(NaiveTime::MIN);
        let sunset = match daylight {
            Daylight::PolarDay => midnight + Duration::days(1),
            _ => midnight,
        };
        Self {
            date,
            sunrise: midnight,
            sunset,
            daylight,
        }
    }
}

fn validate(latitude: f64, longitude: f64) -> Result<(), GeoError> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if valid {
        Ok(())
    } else {
        Err(GeoError::InvalidCoordinate {
            latitude,
            longitude,
        })
    }
}

/// Cosine of the sunrise hour angle, from an approximate solar declination.
///
/// Above 1 the sun stays below the horizon all day, below -1 it never sets.
fn sunrise_hour_angle_cos(latitude: f64, date: NaiveDate) -> f64 {
    let day_of_year = f64::from(date.ordinal());
    let declination = 23.44 * (360.0 / 365.0 * (284.0 + day_of_year)).to_radians().sin();

    // -0.833° accounts for refraction and the solar disc radius.
    let horizon = (-0.833_f64).to_radians();
    let lat = latitude.to_radians();
    let decl = declination.to_radians();
    (horizon.sin() - lat.sin() * decl.sin()) / (lat.cos() * decl.cos())
}

fn polar_kind(latitude: f64, date: NaiveDate) -> Option<Daylight> {
    let cos_h = sunrise_hour_angle_cos(latitude, date);
    if cos_h >= 1.0 {
        Some(Daylight::PolarNight)
    } else if cos_h <= -1.0 {
        Some(Daylight::PolarDay)
    } else {
        None
    }
}

/// Sun times for `date` at the coordinates, in the wall clock of `tz`.
pub fn compute_in<Tz: TimeZone>(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    tz: &Tz,
) -> Result<SunTimes, GeoError> {
    validate(latitude, longitude)?;

    if let Some(kind) = polar_kind(latitude, date) {
        return Ok(SunTimes::polar(date, kind));
    }

    let coord = Coordinates::new(latitude, longitude).ok_or(GeoError::InvalidCoordinate {
        latitude,
        longitude,
    })?;
    let solar_day = SolarDay::new(coord, date);
    let sunrise = solar_day
        .event_time(SolarEvent::Sunrise)
        .with_timezone(tz)
        .naive_local();
    let sunset = solar_day
        .event_time(SolarEvent::Sunset)
        .with_timezone(tz)
        .naive_local();

    // Right at the polar circles the approximation above and the crate can
    // disagree; the crate then returns times nowhere near the requested day.
    let near = |t: NaiveDateTime| (t.date() - date).num_days().abs() <= 1;
    if !(near(sunrise) && near(sunset)) || sunset < sunrise {
        let kind = if sunrise_hour_angle_cos(latitude, date) > 0.0 {
            Daylight::PolarNight
        } else {
            Daylight::PolarDay
        };
        return Ok(SunTimes::polar(date, kind));
    }

    Ok(SunTimes {
        date,
        sunrise,
        sunset,
        daylight: Daylight::Regular,
    })
}

/// Sun times for `date` at the coordinates, in the host's local time zone.
pub fn compute(latitude: f64, longitude: f64, date: NaiveDate) -> Result<SunTimes, GeoError> {
    compute_in(latitude, longitude, date, &Local)
}

/// Reuses the last [`SunTimes`] until the date or the coordinates change.
#[derive(Debug, Default)]
pub struct SunCache {
    cached: Option<(f64, f64, SunTimes)>,
}

impl SunCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, date: NaiveDate, latitude: f64, longitude: f64) -> Result<SunTimes, GeoError> {
        self.get_with(date, latitude, longitude, compute)
    }

    fn get_with<F>(
        &mut self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
        calculate: F,
    ) -> Result<SunTimes, GeoError>
    where
        F: FnOnce(f64, f64, NaiveDate) -> Result<SunTimes, GeoError>,
    {
        if let Some((lat, lon, times)) = self.cached
            && times.date == date
            && lat == latitude
            && lon == longitude
        {
            return Ok(times);
        }

        let times = calculate(latitude, longitude, date)?;
        self.cached = Some((latitude, longitude, times));
        Ok(times)
    }

    /// Whether the next lookup for these inputs would recompute.
    pub fn is_stale(&self, date: NaiveDate, latitude: f64, longitude: f64) -> bool {
        !matches!(self.cached, Some((lat, lon, times))
            if times.date == date && lat == latitude && lon == longitude)
    }
}
