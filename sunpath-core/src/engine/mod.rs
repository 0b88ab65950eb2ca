//! The astronomical engine: apparent sun position, clear-sky irradiance and
//! sun times for a location and a batch of timestamps.
//!
//! Everything above this module treats the engine as a black box through the
//! [`AstronomicalEngine`] trait. [`SpaEngine`] is the production
//! implementation built on NREL SPA.

pub mod clear_sky;
pub mod poa;
mod spa;

pub use spa::SpaEngine;

use crate::error::{Result, SunpathError};
use crate::location::Location;
use crate::series::PoaIrradiance;
use crate::sun::{SunPosition, SunTimes};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use sunpath_utils::serde_float::finite_or_null;

/// Standard sea-level pressure, hPa
pub const STANDARD_PRESSURE_HPA: f64 = 1013.25;

/// Standard temperature, °C
pub const STANDARD_TEMPERATURE_C: f64 = 15.0;

/// Atmospheric conditions used for refraction correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    /// Pressure in hPa
    pub pressure: f64,
    /// Temperature in °C
    pub temperature: f64,
    /// Apply refraction correction to the sun altitude
    pub refraction: bool,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            pressure: STANDARD_PRESSURE_HPA,
            temperature: STANDARD_TEMPERATURE_C,
            refraction: true,
        }
    }
}

/// The clear-sky irradiance models the engine can evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearSkyModel {
    #[default]
    Ineichen,
    Haurwitz,
    SimplifiedSolis,
}

impl ClearSkyModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearSkyModel::Ineichen => "ineichen",
            ClearSkyModel::Haurwitz => "haurwitz",
            ClearSkyModel::SimplifiedSolis => "simplified_solis",
        }
    }
}

impl fmt::Display for ClearSkyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClearSkyModel {
    type Err = SunpathError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ineichen" => Ok(ClearSkyModel::Ineichen),
            "haurwitz" => Ok(ClearSkyModel::Haurwitz),
            "simplified_solis" => Ok(ClearSkyModel::SimplifiedSolis),
            other => Err(SunpathError::invalid(format!(
                "unknown clear-sky model {:?} (expected ineichen, haurwitz or simplified_solis)",
                other
            ))),
        }
    }
}

/// Clear-sky irradiance components at one instant, W/m².
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClearSkySample {
    #[serde(with = "finite_or_null")]
    pub ghi: f64,
    #[serde(with = "finite_or_null")]
    pub dni: f64,
    #[serde(with = "finite_or_null")]
    pub dhi: f64,
}

/// A tilted collector surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Tilt from horizontal, degrees
    pub tilt: f64,
    /// Facing direction, degrees clockwise from north
    pub azimuth: f64,
    /// Ground reflectance, 0 to 1
    pub albedo: f64,
}

/// Source of sun positions, clear-sky irradiance and sun times.
///
/// Batched over a slice of timestamps; implementations return exactly one
/// result per timestamp, in order.
pub trait AstronomicalEngine: Send + Sync {
    /// Apparent sun position for each timestamp.
    fn positions(
        &self,
        location: &Location,
        atmosphere: &Atmosphere,
        timestamps: &[DateTime<FixedOffset>],
    ) -> Result<Vec<SunPosition>>;

    /// Clear-sky GHI/DNI/DHI for each timestamp.
    fn clear_sky(
        &self,
        location: &Location,
        timestamps: &[DateTime<FixedOffset>],
        model: ClearSkyModel,
    ) -> Result<Vec<ClearSkySample>>;

    /// Sunrise, sunset and transit for a calendar date in the location's fixed offset.
    fn sun_times(&self, location: &Location, date: NaiveDate) -> Result<SunTimes>;

    /// Decompose horizontal irradiance onto a tilted surface.
    fn plane_of_array(
        &self,
        sample: &ClearSkySample,
        sun: &SunPosition,
        surface: &Surface,
    ) -> PoaIrradiance {
        poa::isotropic(sample, sun, surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_parsing() {
        assert_eq!("ineichen".parse::<ClearSkyModel>().unwrap(), ClearSkyModel::Ineichen);
        assert_eq!("Haurwitz".parse::<ClearSkyModel>().unwrap(), ClearSkyModel::Haurwitz);
        assert_eq!(
            "simplified_solis".parse::<ClearSkyModel>().unwrap(),
            ClearSkyModel::SimplifiedSolis
        );
        assert!("perez".parse::<ClearSkyModel>().unwrap_err().is_client_error());
    }

    #[test]
    fn test_model_serde_names_match_display() {
        for model in [
            ClearSkyModel::Ineichen,
            ClearSkyModel::Haurwitz,
            ClearSkyModel::SimplifiedSolis,
        ] {
            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json, format!("\"{}\"", model));
        }
    }
}
