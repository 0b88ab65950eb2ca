//! Sun position series, sun times and polar-condition heuristics.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use log::{debug, error};
use sunpath_core::error::{Result, SunpathError};
use sunpath_core::{
    AstronomicalEngine, Atmosphere, ExtremeConditions, Location, SunPosition, SunTimes, TimeWindow,
};
use sunpath_utils::dates::day_of_year;

/// Latitude beyond which a location counts as polar, degrees.
pub const POLAR_LATITUDE: f64 = 66.5;

/// Day-of-year band around the June solstice.
const JUNE_BAND: std::ops::RangeInclusive<u32> = 152..=213;

/// Hours of daylight between sunrise and sunset.
///
/// With either end missing the day is taken to be 24 hours when there is no
/// sunrise and 0 hours otherwise.
pub fn day_length(times: &SunTimes) -> f64 {
    match (times.sunrise, times.sunset) {
        (Some(sunrise), Some(sunset)) => (sunset - sunrise).num_seconds() as f64 / 3600.0,
        (None, _) => 24.0,
        (Some(_), None) => 0.0,
    }
}

fn in_december_band(doy: u32) -> bool {
    doy >= 335 || doy <= 59
}

/// Polar flags for a latitude and date.
///
/// Polar day and night are flagged from fixed day-of-year bands around the
/// solstices, not from the actual sun path.
pub fn validate_extreme_conditions(latitude: f64, date: NaiveDate) -> ExtremeConditions {
    let doy = day_of_year(&date);
    let is_polar_region = latitude.abs() > POLAR_LATITUDE;
    let (is_polar_day, is_polar_night) = if !is_polar_region {
        (false, false)
    } else if latitude > 0.0 {
        (JUNE_BAND.contains(&doy), in_december_band(doy))
    } else {
        (in_december_band(doy), JUNE_BAND.contains(&doy))
    };
    let warning = if is_polar_day {
        Some("Polar day (midnight sun): the sun does not set below the horizon.")
    } else if is_polar_night {
        Some("Polar night: the sun does not rise above the horizon.")
    } else if is_polar_region {
        Some("Polar region: the sun path may be unusual.")
    } else {
        None
    };
    ExtremeConditions {
        is_polar_region,
        is_polar_day,
        is_polar_night,
        warning: warning.map(str::to_string),
    }
}

/// Hour angle in degrees: 15° per hour from solar noon, negative before it.
pub fn hour_angle(timestamp: &DateTime<FixedOffset>, solar_noon: &DateTime<FixedOffset>) -> f64 {
    let hours = (*timestamp - *solar_noon).num_milliseconds() as f64 / 3_600_000.0;
    15.0 * hours
}

/// Solar noon for the window's date: the engine transit, or 12:00 local when
/// the engine has none.
pub fn solar_noon(times: &SunTimes, date: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    if let Some(transit) = times.transit {
        return Ok(transit);
    }
    date.and_hms_opt(12, 0, 0)
        .and_then(|local| offset.from_local_datetime(&local).single())
        .ok_or_else(|| SunpathError::ComputationError(format!("unrepresentable noon on {}", date)))
}

/// Sun positions for every instant of a window, with hour angles.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSeries {
    pub timestamps: Vec<DateTime<FixedOffset>>,
    pub positions: Vec<SunPosition>,
    pub sun_times: SunTimes,
}

impl PositionSeries {
    /// Highest apparent altitude in the series.
    pub fn max_altitude(&self) -> Option<f64> {
        self.positions
            .iter()
            .map(|p| p.altitude)
            .filter(|a| a.is_finite())
            .fold(None, |acc, a| Some(acc.map_or(a, |m: f64| m.max(a))))
    }
}

/// Build the position series for a location and window.
///
/// Sun times always cover the full calendar date regardless of the window.
pub fn build(
    engine: &dyn AstronomicalEngine,
    location: &Location,
    window: &TimeWindow,
    atmosphere: &Atmosphere,
) -> Result<PositionSeries> {
    let offset = location.utc_offset()?;
    let timestamps = window.timestamps(offset)?;
    let sun_times = engine.sun_times(location, window.date)?;
    let noon = solar_noon(&sun_times, window.date, offset)?;

    let raw = engine.positions(location, atmosphere, &timestamps)?;
    if raw.len() != timestamps.len() {
        error!(
            "engine returned {} positions for {} timestamps",
            raw.len(),
            timestamps.len()
        );
        return Err(SunpathError::UpstreamDataMissing(format!(
            "expected {} sun positions, got {}",
            timestamps.len(),
            raw.len()
        )));
    }
    let positions = raw
        .into_iter()
        .zip(&timestamps)
        .map(|(p, ts)| SunPosition::new(p.altitude, p.azimuth).with_hour_angle(hour_angle(ts, &noon)))
        .collect::<Vec<_>>();
    debug!("built position series of {} points for {}", positions.len(), window.date);

    Ok(PositionSeries {
        timestamps,
        positions,
        sun_times,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedEngine;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_day_length() {
        let regular = SunTimes {
            sunrise: Some(at("2025-06-21T04:30:00+08:00")),
            sunset: Some(at("2025-06-21T19:15:00+08:00")),
            transit: Some(at("2025-06-21T11:52:00+08:00")),
        };
        assert!((day_length(&regular) - 14.75).abs() < 1e-9);

        let none = SunTimes {
            sunrise: None,
            sunset: None,
            transit: None,
        };
        assert_eq!(day_length(&none), 24.0);

        let no_sunset = SunTimes {
            sunset: None,
            ..regular
        };
        assert_eq!(day_length(&no_sunset), 0.0);
        let no_sunrise = SunTimes {
            sunrise: None,
            ..regular
        };
        assert_eq!(day_length(&no_sunrise), 24.0);
    }

    #[test]
    fn test_extreme_conditions_north() {
        let summer = validate_extreme_conditions(69.65, ymd(2025, 6, 21));
        assert!(summer.is_polar_region && summer.is_polar_day && !summer.is_polar_night);
        assert!(summer.warning.unwrap().contains("midnight sun"));

        let winter = validate_extreme_conditions(69.65, ymd(2025, 12, 21));
        assert!(winter.is_polar_night && !winter.is_polar_day);

        let spring = validate_extreme_conditions(69.65, ymd(2025, 4, 10));
        assert!(spring.is_polar_region && !spring.is_polar_day && !spring.is_polar_night);
        assert!(spring.warning.unwrap().starts_with("Polar region"));
    }

    #[test]
    fn test_extreme_conditions_south_is_mirrored() {
        let june = validate_extreme_conditions(-75.0, ymd(2025, 6, 21));
        assert!(june.is_polar_night);
        let january = validate_extreme_conditions(-75.0, ymd(2025, 1, 15));
        assert!(january.is_polar_day);
    }

    #[test]
    fn test_mid_latitude_has_no_warning() {
        let seoul = validate_extreme_conditions(37.5665, ymd(2025, 6, 21));
        assert!(!seoul.is_polar_region);
        assert!(seoul.warning.is_none());
        // boundary is exclusive
        assert!(!validate_extreme_conditions(66.5, ymd(2025, 6, 21)).is_polar_region);
    }

    #[test]
    fn test_band_edges() {
        assert!(validate_extreme_conditions(70.0, ymd(2025, 6, 1)).is_polar_day); // doy 152
        assert!(!validate_extreme_conditions(70.0, ymd(2025, 5, 31)).is_polar_day);
        assert!(validate_extreme_conditions(70.0, ymd(2025, 2, 28)).is_polar_night); // doy 59
        assert!(!validate_extreme_conditions(70.0, ymd(2025, 3, 1)).is_polar_night);
    }

    #[test]
    fn test_hour_angle() {
        let noon = at("2025-06-21T12:00:00+08:00");
        assert_eq!(hour_angle(&at("2025-06-21T09:00:00+08:00"), &noon), -45.0);
        assert_eq!(hour_angle(&at("2025-06-21T13:30:00+08:00"), &noon), 22.5);
    }

    #[test]
    fn test_solar_noon_falls_back_to_local_noon() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let times = SunTimes {
            sunrise: None,
            sunset: None,
            transit: None,
        };
        let noon = solar_noon(&times, ymd(2025, 6, 21), offset).unwrap();
        assert_eq!(noon.to_rfc3339(), "2025-06-21T12:00:00+01:00");
    }

    #[test]
    fn test_build_series() {
        let engine = FixedEngine::daylight();
        let location = Location::new(37.5665, 126.978, 38.0).unwrap();
        let window = TimeWindow::parse("2025-06-21", "06:00", "18:00", 60).unwrap();
        let series = build(&engine, &location, &window, &Atmosphere::default()).unwrap();
        assert_eq!(series.timestamps.len(), 13);
        assert_eq!(series.positions.len(), 13);
        assert_eq!(series.timestamps[0].offset().local_minus_utc(), 8 * 3600);
        for p in &series.positions {
            assert!((p.zenith - (90.0 - p.altitude)).abs() < 1e-12);
        }
        assert_eq!(series.positions[6].hour_angle, 0.0);
        assert_eq!(series.max_altitude(), Some(series.positions[6].altitude));
    }

    #[test]
    fn test_reversed_window_is_empty() {
        let engine = FixedEngine::daylight();
        let location = Location::new(37.5665, 126.978, 38.0).unwrap();
        let window = TimeWindow::parse("2025-06-21", "18:00", "06:00", 60).unwrap();
        let series = build(&engine, &location, &window, &Atmosphere::default()).unwrap();
        assert!(series.positions.is_empty());
        assert_eq!(series.max_altitude(), None);
        assert!(series.sun_times.sunrise.is_some());
    }

    #[test]
    fn test_short_engine_output_is_upstream_error() {
        let engine = FixedEngine::daylight().truncated();
        let location = Location::new(37.5665, 126.978, 38.0).unwrap();
        let window = TimeWindow::parse("2025-06-21", "06:00", "18:00", 60).unwrap();
        let err = build(&engine, &location, &window, &Atmosphere::default()).unwrap_err();
        assert!(matches!(err, SunpathError::UpstreamDataMissing(_)));
        assert!(!err.is_client_error());
    }
}
