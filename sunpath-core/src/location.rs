use crate::error::{Result, SunpathError};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use sunpath_utils::dates::solar_utc_offset;

/// An observer position on the Earth's surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees, -90 to 90
    pub latitude: f64,
    /// Longitude in degrees, -180 to 180
    pub longitude: f64,
    /// Altitude above sea level in meters
    pub altitude: f64,
}

impl Location {
    /// Validate and build a location.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(SunpathError::invalid(format!(
                "latitude must be between -90 and 90, got {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(SunpathError::invalid(format!(
                "longitude must be between -180 and 180, got {}",
                longitude
            )));
        }
        if !altitude.is_finite() || altitude < 0.0 {
            return Err(SunpathError::invalid(format!(
                "altitude must be >= 0 meters, got {}",
                altitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }

    /// The fixed offset used for every timestamp generated at this location.
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        solar_utc_offset(self.longitude).map_err(|e| SunpathError::invalid(e.to_string()))
    }
}
