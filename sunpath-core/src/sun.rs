use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sunpath_utils::serde_float::finite_or_null;

/// Apparent (refraction-corrected) sun position at one instant.
///
/// Azimuth is measured clockwise from north (0 = N, 90 = E).
/// The zenith is always `90 - altitude`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunPosition {
    #[serde(with = "finite_or_null")]
    pub altitude: f64,
    #[serde(with = "finite_or_null")]
    pub azimuth: f64,
    #[serde(with = "finite_or_null")]
    pub zenith: f64,
    /// Degrees from solar noon, 15° per hour, negative before noon
    #[serde(with = "finite_or_null", default)]
    pub hour_angle: f64,
}

impl SunPosition {
    pub fn new(altitude: f64, azimuth: f64) -> Self {
        Self {
            altitude,
            azimuth,
            zenith: 90.0 - altitude,
            hour_angle: 0.0,
        }
    }

    pub fn with_hour_angle(self, hour_angle: f64) -> Self {
        Self { hour_angle, ..self }
    }

    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }
}

/// Rise, set and meridian transit for one calendar date.
///
/// Sunrise and sunset are absent under polar day or polar night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunTimes {
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    pub transit: Option<DateTime<FixedOffset>>,
}
