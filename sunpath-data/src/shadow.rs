//! Shadow geometry for a vertical object on a spherical Earth.
//!
//! The shadow state depends only on the sun altitude:
//! at or below the horizon there is no sun, within [`NEAR_HORIZON_EPSILON`]
//! degrees of it the shadow is unbounded, and above that the length is
//! `height / tan(altitude)`, optionally scaled for sloped terrain.

use serde::{Deserialize, Serialize};
use sunpath_core::error::{Result, SunpathError};
use sunpath_core::{Location, ObjectSpec, ShadowSample, ShadowStatus, SunPosition};

/// Sun altitude in degrees below which the shadow is treated as unbounded.
pub const NEAR_HORIZON_EPSILON: f64 = 0.1;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default tolerance for [`validate`], percent.
pub const DEFAULT_TOLERANCE_PERCENT: f64 = 2.0;

/// Smallest slope correction factor applied to a shadow length.
const MIN_SLOPE_FACTOR: f64 = 0.1;

/// Shadow length, direction and status for one sun position.
///
/// Coordinates are left empty; see [`sample_at`] for the full sample.
pub fn cast(object: &ObjectSpec, altitude: f64, azimuth: f64) -> ShadowSample {
    let (length, direction, status) = if altitude <= 0.0 {
        (f64::INFINITY, None, ShadowStatus::NoSun)
    } else if altitude <= NEAR_HORIZON_EPSILON {
        (f64::INFINITY, Some(opposite(azimuth)), ShadowStatus::InfiniteShadow)
    } else {
        let mut length = object.height / altitude.to_radians().tan();
        if object.terrain_slope > 0.0 {
            length *= slope_correction(object.terrain_slope, object.terrain_aspect, azimuth, altitude);
        }
        (length.abs(), Some(opposite(azimuth)), ShadowStatus::Normal)
    };
    ShadowSample {
        length,
        direction,
        status,
        endpoint_coordinates: None,
        polygon: None,
        description: None,
    }
}

/// The full shadow sample for an object standing at `origin`: length,
/// direction, endpoint, footprint polygon (when the object has a width)
/// and a short description.
pub fn sample_at(object: &ObjectSpec, origin: &Location, sun: &SunPosition) -> ShadowSample {
    let mut sample = cast(object, sun.altitude, sun.azimuth);
    if sample.status != ShadowStatus::Normal {
        if let Some(direction) = sample.direction {
            sample.description = Some(describe(sample.length, direction, object.height));
        }
        return sample;
    }
    let Some(direction) = sample.direction else {
        return sample;
    };
    let (lat, lon) = (origin.latitude, origin.longitude);
    sample.endpoint_coordinates = destination(lat, lon, sample.length, direction)
        .map(|(end_lat, end_lon)| [[lon, lat], [end_lon, end_lat]]);
    sample.polygon = object
        .width
        .and_then(|width| polygon(lat, lon, width, sample.length, direction));
    sample.description = Some(describe(sample.length, direction, object.height));
    sample
}

/// The compass direction pointing away from the sun.
fn opposite(azimuth: f64) -> f64 {
    (azimuth + 180.0).rem_euclid(360.0)
}

/// Multiplier for a shadow falling on a planar slope.
///
/// `1 + sin(slope) * cos(Δ) / tan(altitude)` where Δ is the angle between the
/// sun azimuth and the terrain aspect, folded into [0, 180]. Never below 0.1.
pub fn slope_correction(slope: f64, aspect: f64, sun_azimuth: f64, sun_altitude: f64) -> f64 {
    let mut delta = (sun_azimuth - aspect).abs();
    if delta > 180.0 {
        delta = 360.0 - delta;
    }
    let factor = 1.0
        + slope.to_radians().sin() * delta.to_radians().cos() / sun_altitude.to_radians().tan();
    factor.max(MIN_SLOPE_FACTOR)
}

/// Great-circle destination `(lat, lon)` reached from a start point after
/// `distance` meters on an initial `bearing`. `None` for an unbounded distance.
pub fn destination(lat: f64, lon: f64, distance: f64, bearing: f64) -> Option<(f64, f64)> {
    if !distance.is_finite() {
        return None;
    }
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();
    let theta = bearing.to_radians();
    let delta = distance / EARTH_RADIUS_M;

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let end_lon = (lambda2.to_degrees() + 180.0).rem_euclid(360.0) - 180.0;
    Some((phi2.to_degrees(), end_lon))
}

/// Great-circle distance in meters and initial bearing in degrees between two points.
pub fn inverse(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let distance = 2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt());

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    (distance, bearing)
}

/// Ground footprint of a shadow cast by an object of the given width, as a
/// `[lon, lat]` ring: both object corners, then the far corners in reverse.
pub fn polygon(lat: f64, lon: f64, width: f64, length: f64, direction: f64) -> Option<Vec<[f64; 2]>> {
    if !length.is_finite() {
        return None;
    }
    let perpendicular = (direction - 90.0).rem_euclid(360.0);
    let half_width = width / 2.0;

    let mut corners = Vec::with_capacity(2);
    for offset in [perpendicular, (perpendicular + 180.0).rem_euclid(360.0)] {
        let (corner_lat, corner_lon) = destination(lat, lon, half_width, offset)?;
        corners.push([corner_lon, corner_lat]);
    }
    let mut far = Vec::with_capacity(2);
    for corner in &corners {
        let (end_lat, end_lon) = destination(corner[1], corner[0], length, direction)?;
        far.push([end_lon, end_lat]);
    }

    Some(vec![corners[0], corners[1], far[1], far[0]])
}

const COMPASS: [&str; 8] = [
    "north",
    "northeast",
    "east",
    "southeast",
    "south",
    "southwest",
    "west",
    "northwest",
];

/// Eight-point compass word for a direction in degrees.
pub fn compass_point(direction: f64) -> &'static str {
    let idx = ((direction + 22.5) / 45.0).floor() as i64;
    COMPASS[idx.rem_euclid(8) as usize]
}

/// Human-readable summary of a shadow relative to the object height.
pub fn describe(length: f64, direction: f64, height: f64) -> String {
    if !length.is_finite() {
        return "The shadow is infinitely long (sun very low)".to_string();
    }
    let ratio = length / height;
    let size = if ratio < 1.0 {
        "A short"
    } else if ratio < 3.0 {
        "A medium"
    } else {
        "A long"
    };
    format!(
        "{} shadow extends {:.2} m to the {} ({:.1}x the object height)",
        size,
        length,
        compass_point(direction),
        ratio
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pass,
    Fail,
    Skipped,
}

/// Comparison of a computed shadow length against a reference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowValidation {
    pub status: ValidationStatus,
    pub calculated: Option<f64>,
    pub expected: f64,
    pub error: Option<f64>,
    pub error_percent: Option<f64>,
    pub tolerance: f64,
}

/// Check `height / tan(altitude)` against an expected length.
pub fn validate(height: f64, altitude: f64, expected: f64, tolerance_percent: f64) -> Result<ShadowValidation> {
    let object = ObjectSpec::new(height)?;
    if !expected.is_finite() || expected <= 0.0 {
        return Err(SunpathError::InvalidInput(format!(
            "expected shadow length must be greater than 0, got {}",
            expected
        )));
    }
    let calculated = cast(&object, altitude, 0.0).length;
    if !calculated.is_finite() {
        return Ok(ShadowValidation {
            status: ValidationStatus::Skipped,
            calculated: None,
            expected,
            error: None,
            error_percent: None,
            tolerance: tolerance_percent,
        });
    }
    let error = (calculated - expected).abs();
    let error_percent = error / expected * 100.0;
    let status = if error_percent <= tolerance_percent {
        ValidationStatus::Pass
    } else {
        ValidationStatus::Fail
    };
    Ok(ShadowValidation {
        status,
        calculated: Some(calculated),
        expected,
        error: Some(error),
        error_percent: Some(error_percent),
        tolerance: tolerance_percent,
    })
}
