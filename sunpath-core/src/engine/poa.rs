//! Plane-of-array irradiance with an isotropic sky.

use super::{ClearSkySample, Surface};
use crate::series::PoaIrradiance;
use crate::sun::SunPosition;

/// Angle between the sun and the surface normal, degrees.
pub fn angle_of_incidence(sun: &SunPosition, surface: &Surface) -> f64 {
    let zenith = sun.zenith.to_radians();
    let tilt = surface.tilt.to_radians();
    let cos_aoi = zenith.cos() * tilt.cos()
        + zenith.sin() * tilt.sin() * (sun.azimuth - surface.azimuth).to_radians().cos();
    cos_aoi.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Transpose horizontal irradiance onto a tilted surface.
pub fn isotropic(sample: &ClearSkySample, sun: &SunPosition, surface: &Surface) -> PoaIrradiance {
    let aoi = angle_of_incidence(sun, surface);
    let cos_aoi = aoi.to_radians().cos();
    let cos_tilt = surface.tilt.to_radians().cos();

    let direct = if cos_aoi > 0.0 && sun.is_above_horizon() {
        sample.dni * cos_aoi
    } else {
        0.0
    };
    let sky_diffuse = sample.dhi * (1.0 + cos_tilt) / 2.0;
    let ground_diffuse = sample.ghi * surface.albedo * (1.0 - cos_tilt) / 2.0;

    PoaIrradiance {
        global: direct + sky_diffuse + ground_diffuse,
        direct,
        sky_diffuse,
        ground_diffuse,
        aoi,
    }
}
