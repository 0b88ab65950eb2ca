//! A deterministic engine for exercising the pipeline without SPA.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Timelike};
use std::sync::atomic::{AtomicUsize, Ordering};
use sunpath_core::error::{Result, SunpathError};
use sunpath_core::{
    AstronomicalEngine, Atmosphere, ClearSkyModel, ClearSkySample, Location, SunPosition, SunTimes,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Daylight {
    Regular,
    PolarDay,
    PolarNight,
}

/// Sun on a straight-line path peaking at 12:00 local time.
///
/// Altitude drops 10° per hour either side of noon from `peak_altitude`, so
/// with the default 70° peak the sun rises at 05:00 and sets at 19:00.
/// GHI is `1000 * sin(altitude)` with 15% of it diffuse.
#[derive(Debug)]
pub struct FixedEngine {
    peak_altitude: f64,
    daylight: Daylight,
    drop_last: bool,
    calls: AtomicUsize,
}

impl FixedEngine {
    pub fn daylight() -> Self {
        Self {
            peak_altitude: 70.0,
            daylight: Daylight::Regular,
            drop_last: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn polar_day() -> Self {
        Self {
            peak_altitude: 40.0,
            daylight: Daylight::PolarDay,
            ..Self::daylight()
        }
    }

    pub fn polar_night() -> Self {
        Self {
            peak_altitude: -5.0,
            daylight: Daylight::PolarNight,
            ..Self::daylight()
        }
    }

    /// Return one position fewer than asked for.
    pub fn truncated(self) -> Self {
        Self {
            drop_last: true,
            ..self
        }
    }

    /// Number of `positions` calls served so far.
    pub fn position_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn altitude_at(&self, ts: &DateTime<FixedOffset>) -> f64 {
        let hours = f64::from(ts.hour()) + f64::from(ts.minute()) / 60.0;
        match self.daylight {
            Daylight::Regular => self.peak_altitude - 10.0 * (hours - 12.0).abs(),
            Daylight::PolarDay => self.peak_altitude - 2.0 * (hours - 12.0).abs(),
            Daylight::PolarNight => self.peak_altitude - 0.5 * (hours - 12.0).abs(),
        }
    }

    fn azimuth_at(ts: &DateTime<FixedOffset>) -> f64 {
        let hours = f64::from(ts.hour()) + f64::from(ts.minute()) / 60.0;
        (180.0 + 15.0 * (hours - 12.0)).rem_euclid(360.0)
    }

    fn local(offset: FixedOffset, date: NaiveDate, hour: u32) -> Result<DateTime<FixedOffset>> {
        date.and_hms_opt(hour, 0, 0)
            .and_then(|local| offset.from_local_datetime(&local).single())
            .ok_or_else(|| SunpathError::ComputationError("bad fixture time".into()))
    }
}

impl AstronomicalEngine for FixedEngine {
    fn positions(
        &self,
        _location: &Location,
        _atmosphere: &Atmosphere,
        timestamps: &[DateTime<FixedOffset>],
    ) -> Result<Vec<SunPosition>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut positions: Vec<SunPosition> = timestamps
            .iter()
            .map(|ts| SunPosition::new(self.altitude_at(ts), Self::azimuth_at(ts)))
            .collect();
        if self.drop_last {
            positions.pop();
        }
        Ok(positions)
    }

    fn clear_sky(
        &self,
        _location: &Location,
        timestamps: &[DateTime<FixedOffset>],
        _model: ClearSkyModel,
    ) -> Result<Vec<ClearSkySample>> {
        Ok(timestamps
            .iter()
            .map(|ts| {
                let altitude = self.altitude_at(ts);
                if altitude <= 0.0 {
                    return ClearSkySample::default();
                }
                let sin_alt = altitude.to_radians().sin();
                let ghi = 1000.0 * sin_alt;
                let dhi = 0.15 * ghi;
                ClearSkySample {
                    ghi,
                    dni: (ghi - dhi) / sin_alt,
                    dhi,
                }
            })
            .collect())
    }

    fn sun_times(&self, location: &Location, date: NaiveDate) -> Result<SunTimes> {
        let offset = location.utc_offset()?;
        let transit = Some(Self::local(offset, date, 12)?);
        Ok(match self.daylight {
            Daylight::Regular => SunTimes {
                sunrise: Some(Self::local(offset, date, 5)?),
                sunset: Some(Self::local(offset, date, 19)?),
                transit,
            },
            Daylight::PolarDay | Daylight::PolarNight => SunTimes {
                sunrise: None,
                sunset: None,
                transit,
            },
        })
    }
}
