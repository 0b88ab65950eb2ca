//! Per-instant samples and the assembled series point.
//!
//! These types serialize directly into the series export format:
//! `{timestamp, sun, irradiance|null, shadow|null}` with every non-finite
//! number written as `null`.

use crate::sun::SunPosition;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sunpath_utils::serde_float::{finite_or_null, unbounded_or_null};

/// Fraction of GHI taken as photosynthetically active radiation.
pub const PAR_FRACTION: f64 = 0.45;

/// Clear-sky irradiance at one instant, W/m².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrradianceSample {
    #[serde(with = "finite_or_null")]
    pub ghi: f64,
    #[serde(with = "finite_or_null")]
    pub dni: f64,
    #[serde(with = "finite_or_null")]
    pub dhi: f64,
    #[serde(default)]
    pub par: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poa: Option<PoaIrradiance>,
}

/// Irradiance on a tilted plane, split into its components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoaIrradiance {
    #[serde(with = "finite_or_null")]
    pub global: f64,
    #[serde(with = "finite_or_null")]
    pub direct: f64,
    #[serde(with = "finite_or_null")]
    pub sky_diffuse: f64,
    #[serde(with = "finite_or_null")]
    pub ground_diffuse: f64,
    /// Angle of incidence in degrees
    #[serde(with = "finite_or_null")]
    pub aoi: f64,
}

impl PoaIrradiance {
    pub fn diffuse(&self) -> f64 {
        self.sky_diffuse + self.ground_diffuse
    }
}

/// Shadow state for one instant, driven by the sun altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowStatus {
    /// Sun above the near-horizon threshold, shadow length is finite
    Normal,
    /// Sun barely above the horizon, shadow is unbounded but has a direction
    InfiniteShadow,
    /// Sun at or below the horizon
    NoSun,
}

/// Shadow cast by the object at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowSample {
    /// Length in meters, +infinity when unbounded
    #[serde(with = "unbounded_or_null")]
    pub length: f64,
    /// Compass direction the shadow points to, degrees
    pub direction: Option<f64>,
    pub status: ShadowStatus,
    /// `[[lon, lat], [end_lon, end_lat]]` for a finite shadow
    pub endpoint_coordinates: Option<[[f64; 2]; 2]>,
    /// Ground footprint `[lon, lat]` ring for an object with a known width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ShadowSample {
    pub fn is_finite(&self) -> bool {
        self.length.is_finite()
    }
}

/// Everything known about one instant of a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub sun: SunPosition,
    pub irradiance: Option<IrradianceSample>,
    pub shadow: Option<ShadowSample>,
}

impl SeriesPoint {
    /// GHI at this instant when irradiance was computed and is finite.
    pub fn ghi(&self) -> Option<f64> {
        self.irradiance
            .map(|i| i.ghi)
            .filter(|ghi| ghi.is_finite())
    }

    /// Finite shadow length at this instant.
    pub fn shadow_length(&self) -> Option<f64> {
        self.shadow
            .as_ref()
            .map(|s| s.length)
            .filter(|len| len.is_finite())
    }
}
