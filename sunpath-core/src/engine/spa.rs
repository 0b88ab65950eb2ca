use super::clear_sky;
use super::{AstronomicalEngine, Atmosphere, ClearSkyModel, ClearSkySample};
use crate::error::{Result, SunpathError};
use crate::location::Location;
use crate::sun::{SunPosition, SunTimes};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use log::debug;
use solar_positioning::time::DeltaT;
use solar_positioning::{spa, Horizon, RefractionCorrection, SunriseResult};

/// NREL Solar Position Algorithm with Ineichen, Haurwitz and simplified
/// Solis clear-sky models on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaEngine;

impl SpaEngine {
    pub fn new() -> Self {
        SpaEngine
    }

    fn position(
        location: &Location,
        timestamp: &DateTime<FixedOffset>,
        refraction: Option<RefractionCorrection>,
    ) -> Result<SunPosition> {
        let delta_t = DeltaT::estimate_from_date_like(timestamp.date_naive()).map_err(engine_error)?;
        let position = spa::solar_position(
            *timestamp,
            location.latitude,
            location.longitude,
            location.altitude,
            delta_t,
            refraction,
        )
        .map_err(engine_error)?;
        Ok(SunPosition::new(position.elevation_angle(), position.azimuth()))
    }
}

fn engine_error(e: solar_positioning::Error) -> SunpathError {
    SunpathError::ComputationError(format!("solar position: {}", e))
}

impl AstronomicalEngine for SpaEngine {
    fn positions(
        &self,
        location: &Location,
        atmosphere: &Atmosphere,
        timestamps: &[DateTime<FixedOffset>],
    ) -> Result<Vec<SunPosition>> {
        let refraction = if atmosphere.refraction {
            let correction = RefractionCorrection::new(atmosphere.pressure, atmosphere.temperature)
                .map_err(|e| SunpathError::invalid(format!("atmosphere: {}", e)))?;
            Some(correction)
        } else {
            None
        };
        debug!(
            "computing {} sun positions at ({}, {})",
            timestamps.len(),
            location.latitude,
            location.longitude
        );
        timestamps
            .iter()
            .map(|ts| Self::position(location, ts, refraction))
            .collect()
    }

    fn clear_sky(
        &self,
        location: &Location,
        timestamps: &[DateTime<FixedOffset>],
        model: ClearSkyModel,
    ) -> Result<Vec<ClearSkySample>> {
        let pressure = clear_sky::altitude_to_pressure(location.altitude);
        debug!("evaluating {} clear-sky model for {} instants", model, timestamps.len());
        timestamps
            .iter()
            .map(|ts| {
                let sun = Self::position(location, ts, Some(RefractionCorrection::standard()))?;
                let day_of_year = ts.date_naive().ordinal();
                Ok(match model {
                    ClearSkyModel::Ineichen => {
                        clear_sky::ineichen(sun.zenith, day_of_year, location.altitude)
                    }
                    ClearSkyModel::Haurwitz => clear_sky::haurwitz(sun.zenith, day_of_year),
                    ClearSkyModel::SimplifiedSolis => {
                        clear_sky::simplified_solis(sun.zenith, day_of_year, pressure)
                    }
                })
            })
            .collect()
    }

    fn sun_times(&self, location: &Location, date: NaiveDate) -> Result<SunTimes> {
        let offset = location.utc_offset()?;
        let midnight = offset
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
            .ok_or_else(|| SunpathError::ComputationError(format!("unrepresentable date {}", date)))?;
        let delta_t = DeltaT::estimate_from_date_like(date).map_err(engine_error)?;
        let result = spa::sunrise_sunset_for_horizon(
            midnight,
            location.latitude,
            location.longitude,
            delta_t,
            Horizon::SunriseSunset,
        )
        .map_err(engine_error)?;
        Ok(match result {
            SunriseResult::RegularDay {
                sunrise,
                transit,
                sunset,
            } => SunTimes {
                sunrise: Some(sunrise),
                sunset: Some(sunset),
                transit: Some(transit),
            },
            SunriseResult::AllDay { transit } | SunriseResult::AllNight { transit } => SunTimes {
                sunrise: None,
                sunset: None,
                transit: Some(transit),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn seoul() -> Location {
        Location::new(37.5665, 126.9780, 38.0).unwrap()
    }

    fn solstice() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 21).unwrap()
    }

    #[test]
    fn test_seoul_solstice_noon() {
        let engine = SpaEngine::new();
        let location = seoul();
        let times = engine.sun_times(&location, solstice()).unwrap();
        let transit = times.transit.unwrap();
        // solar noon sits about half an hour before 12:00 at a +08:00 offset
        assert_eq!(transit.hour(), 11);

        let positions = engine
            .positions(&location, &Atmosphere::default(), &[transit])
            .unwrap();
        assert!((positions[0].altitude - 76.0).abs() <= 1.0, "altitude {}", positions[0].altitude);
        assert!((positions[0].azimuth - 180.0).abs() < 2.0);

        let sky = engine
            .clear_sky(&location, &[transit], ClearSkyModel::Ineichen)
            .unwrap();
        assert!((sky[0].ghi - 1000.0).abs() <= 100.0, "ghi {}", sky[0].ghi);
    }

    #[test]
    fn test_regular_day_has_ordered_times() {
        let times = SpaEngine.sun_times(&seoul(), solstice()).unwrap();
        let (sunrise, sunset) = (times.sunrise.unwrap(), times.sunset.unwrap());
        assert!(sunrise < times.transit.unwrap());
        assert!(times.transit.unwrap() < sunset);
        let hours = (sunset - sunrise).num_minutes() as f64 / 60.0;
        assert!((14.0..15.5).contains(&hours), "day length {}", hours);
    }

    #[test]
    fn test_polar_day_has_no_sunrise() {
        let tromso = Location::new(69.6492, 18.9553, 0.0).unwrap();
        let times = SpaEngine.sun_times(&tromso, solstice()).unwrap();
        assert!(times.sunrise.is_none());
        assert!(times.sunset.is_none());
        assert!(times.transit.is_some());
    }

    #[test]
    fn test_refraction_lifts_low_sun() {
        let location = seoul();
        let morning = DateTime::parse_from_rfc3339("2025-06-21T05:30:00+08:00").unwrap();
        let with = SpaEngine
            .positions(&location, &Atmosphere::default(), &[morning])
            .unwrap();
        let without = SpaEngine
            .positions(
                &location,
                &Atmosphere {
                    refraction: false,
                    ..Atmosphere::default()
                },
                &[morning],
            )
            .unwrap();
        assert!(with[0].altitude > without[0].altitude);
    }

    #[test]
    fn test_night_is_dark() {
        let midnight = DateTime::parse_from_rfc3339("2025-06-21T00:00:00+08:00").unwrap();
        for model in [
            ClearSkyModel::Ineichen,
            ClearSkyModel::Haurwitz,
            ClearSkyModel::SimplifiedSolis,
        ] {
            let sky = SpaEngine.clear_sky(&seoul(), &[midnight], model).unwrap();
            assert_eq!(sky[0], ClearSkySample::default());
        }
    }

    #[test]
    fn test_bad_atmosphere_is_rejected() {
        let atmosphere = Atmosphere {
            pressure: -5.0,
            ..Atmosphere::default()
        };
        let noon = DateTime::parse_from_rfc3339("2025-06-21T12:00:00+08:00").unwrap();
        let err = SpaEngine.positions(&seoul(), &atmosphere, &[noon]).unwrap_err();
        assert!(err.is_client_error());
    }
}
