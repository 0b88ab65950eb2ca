//! Clear-sky irradiance models.
//!
//! Scalar functions of the solar geometry at one instant. Inputs are the
//! apparent zenith in degrees, the day of year and the site altitude or
//! pressure; outputs are in W/m².

use super::ClearSkySample;
use std::f64::consts::PI;

/// Solar constant, W/m²
pub const SOLAR_CONSTANT: f64 = 1366.1;

/// Linke turbidity assumed by the Ineichen model
pub const LINKE_TURBIDITY: f64 = 3.0;

/// Aerosol optical depth at 700 nm assumed by the simplified Solis model
pub const AOD700: f64 = 0.1;

/// Precipitable water in cm assumed by the simplified Solis model
pub const PRECIPITABLE_WATER: f64 = 1.0;

const SEA_LEVEL_PA: f64 = 101_325.0;

/// Extraterrestrial normal irradiance for a day of year (Spencer, 1971).
pub fn extraterrestrial_normal(day_of_year: u32) -> f64 {
    let b = 2.0 * PI * (f64::from(day_of_year) - 1.0) / 365.0;
    let r_over_r0_sq = 1.00011
        + 0.034221 * b.cos()
        + 0.00128 * b.sin()
        + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin();
    SOLAR_CONSTANT * r_over_r0_sq
}

/// Kasten-Young relative air mass; `None` at or below the horizon.
pub fn relative_airmass(zenith: f64) -> Option<f64> {
    if !zenith.is_finite() || zenith >= 90.0 {
        return None;
    }
    let cos_z = zenith.to_radians().cos();
    Some(1.0 / (cos_z + 0.50572 * (96.07995 - zenith).powf(-1.6364)))
}

/// Standard-atmosphere pressure in Pa at an altitude in meters.
pub fn altitude_to_pressure(altitude: f64) -> f64 {
    100.0 * ((44331.514 - altitude) / 11880.516).powf(1.0 / 0.1902632)
}

/// Ineichen-Perez clear-sky model with a fixed Linke turbidity.
pub fn ineichen(zenith: f64, day_of_year: u32, altitude: f64) -> ClearSkySample {
    let Some(relative) = relative_airmass(zenith) else {
        return ClearSkySample::default();
    };
    let cos_z = zenith.to_radians().cos().max(0.0);
    let i0 = extraterrestrial_normal(day_of_year);
    let am = relative * altitude_to_pressure(altitude) / SEA_LEVEL_PA;
    let tl = LINKE_TURBIDITY;

    let fh1 = (-altitude / 8000.0).exp();
    let fh2 = (-altitude / 1250.0).exp();
    let cg1 = 5.09e-5 * altitude + 0.868;
    let cg2 = 3.92e-5 * altitude + 0.0387;

    let ghi = (cg1 * i0 * cos_z * (-cg2 * am * (fh1 + fh2 * (tl - 1.0))).exp()).max(0.0);

    let b = 0.664 + 0.163 / fh1;
    let bnci = i0 * b * (-0.09 * am * (tl - 1.0)).exp();
    let bnci_2 = ghi
        * ((1.0 - (0.1 - 0.2 * (-tl).exp()) / (0.1 + 0.882 / fh1)) / cos_z).clamp(0.0, 1e20);
    let dni = bnci.min(bnci_2);
    let dhi = ghi - dni * cos_z;

    ClearSkySample { ghi, dni, dhi }
}

/// Haurwitz clear-sky GHI, split into beam and diffuse with the Erbs model.
pub fn haurwitz(zenith: f64, day_of_year: u32) -> ClearSkySample {
    if !zenith.is_finite() || zenith >= 90.0 {
        return ClearSkySample::default();
    }
    let cos_z = zenith.to_radians().cos();
    let ghi = 1098.0 * cos_z * (-0.059 / cos_z).exp();
    let (dni, dhi) = erbs(ghi, zenith, extraterrestrial_normal(day_of_year));
    ClearSkySample { ghi, dni, dhi }
}

/// Erbs diffuse fraction decomposition. Returns `(dni, dhi)`.
fn erbs(ghi: f64, zenith: f64, i0: f64) -> (f64, f64) {
    let cos_z = zenith.to_radians().cos();
    let kt = (ghi / (i0 * cos_z.max(0.065))).clamp(0.0, 1.0);
    let diffuse_fraction = if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.8 {
        0.9511 - 0.1604 * kt + 4.388 * kt.powi(2) - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    };
    let dhi = diffuse_fraction * ghi;
    let dni = (ghi - dhi) / cos_z;
    if zenith > 87.0 || ghi < 0.0 || dni < 0.0 {
        (0.0, ghi)
    } else {
        (dni, dhi)
    }
}

/// Simplified Solis clear-sky model (Ineichen, 2008) with fixed aerosol and
/// water vapour content. `pressure` is in Pa.
pub fn simplified_solis(zenith: f64, day_of_year: u32, pressure: f64) -> ClearSkySample {
    let elevation = 90.0 - zenith;
    if !elevation.is_finite() || elevation <= 0.0 {
        return ClearSkySample::default();
    }
    let w = PRECIPITABLE_WATER;
    let aod = AOD700;
    let ln_w = w.ln();
    let ln_p = (pressure / SEA_LEVEL_PA).ln();

    let i0p = {
        let io0 = 1.08 * w.powf(0.0051);
        let i01 = 0.97 * w.powf(0.032);
        let i02 = 0.12 * w.powf(0.56);
        extraterrestrial_normal(day_of_year) * (i02 * aod.powi(2) + i01 * aod + io0 + 0.071 * ln_p)
    };
    let taub = {
        let tb1 = 1.82 + 0.056 * ln_w + 0.0071 * ln_w.powi(2);
        let tb0 = 0.33 + 0.045 * ln_w + 0.0096 * ln_w.powi(2);
        let tbp = 0.0089 * w + 0.13;
        tb1 * aod + tb0 + tbp * ln_p
    };
    let b = {
        let b1 = 0.00925 * aod.powi(2) + 0.0148 * aod - 0.0172;
        let b0 = -0.7565 * aod.powi(2) + 0.5057 * aod + 0.4557;
        b1 * ln_w + b0
    };
    let taug = {
        let tg1 = 1.24 + 0.047 * ln_w + 0.0061 * ln_w.powi(2);
        let tg0 = 0.27 + 0.043 * ln_w + 0.0090 * ln_w.powi(2);
        let tgp = 0.0079 * w + 0.1;
        tg1 * aod + tg0 + tgp * ln_p
    };
    let g = -0.0147 * ln_w - 0.3079 * aod.powi(2) + 0.2846 * aod + 0.3798;
    let taud = {
        let (td4, td3, td2, td1, td0, tdp) = if aod < 0.05 {
            (
                86.0 * w - 13800.0,
                -3.11 * w + 79.4,
                -0.23 * w + 74.8,
                0.092 * w - 8.86,
                0.0042 * w + 3.12,
                -0.83 * (1.0 + aod).powf(-17.2),
            )
        } else {
            (
                -0.21 * w + 11.6,
                0.27 * w - 20.7,
                -0.134 * w + 15.5,
                0.0554 * w - 5.71,
                0.0057 * w + 2.94,
                -0.71 * (1.0 + aod).powf(-15.0),
            )
        };
        td4 * aod.powi(4) + td3 * aod.powi(3) + td2 * aod.powi(2) + td1 * aod + td0 + tdp * ln_p
    };
    let d = {
        let dp = 1.0 / (18.0 + 152.0 * aod);
        -0.337 * aod.powi(2) + 0.63 * aod + 0.116 + dp * ln_p
    };

    let sin_elev = elevation.to_radians().sin().max(1e-30);
    ClearSkySample {
        ghi: i0p * (-taug / sin_elev.powf(g)).exp() * sin_elev,
        dni: i0p * (-taub / sin_elev.powf(b)).exp(),
        dhi: i0p * (-taud / sin_elev.powf(d)).exp(),
    }
}
