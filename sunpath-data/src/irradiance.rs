//! Clear-sky irradiance layered onto a position series, with daily totals,
//! descriptive statistics and plausibility checks.

use crate::position::PositionSeries;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use sunpath_core::error::{Result, SunpathError};
use sunpath_core::series::PAR_FRACTION;
use sunpath_core::{
    AstronomicalEngine, ChannelStats, ClearSkyModel, ClearSkySample, DailyTotals, IrradianceSample,
    IrradianceStatistics, Location, Surface,
};
use sunpath_utils::numbers::finite;

/// Upper plausibility bounds, W/m²
const MAX_GHI: f64 = 1500.0;
const MAX_DNI: f64 = 1500.0;
const MAX_DHI: f64 = 1000.0;

/// Accepted range of `ghi / (dni + dhi)`
const RATIO_RANGE: std::ops::RangeInclusive<f64> = 0.5..=1.5;

/// Photosynthetically active radiation approximated from GHI.
pub fn par(ghi: f64) -> f64 {
    ghi * PAR_FRACTION
}

/// Trapezoidal integral of uniformly spaced W/m² samples, in kWh/m².
///
/// Non-finite samples count as zero and negative ones are clamped to zero so
/// the total is never negative.
pub fn daily_total(values: &[f64], interval_hours: f64) -> f64 {
    let clean: Vec<f64> = values
        .iter()
        .map(|v| finite(*v).unwrap_or(0.0).max(0.0))
        .collect();
    let watt_hours: f64 = clean
        .windows(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0 * interval_hours)
        .sum();
    watt_hours / 1000.0
}

pub fn daily_totals(samples: &[ClearSkySample], interval_hours: f64) -> DailyTotals {
    let channel = |f: fn(&ClearSkySample) -> f64| {
        let values: Vec<f64> = samples.iter().map(f).collect();
        daily_total(&values, interval_hours)
    };
    DailyTotals {
        ghi: channel(|s| s.ghi),
        dni: channel(|s| s.dni),
        dhi: channel(|s| s.dhi),
    }
}

/// max / mean / min / sample standard deviation over the finite values.
pub fn channel_stats(values: &[f64]) -> Option<ChannelStats> {
    let clean: Vec<f64> = values.iter().copied().filter_map(finite).collect();
    if clean.is_empty() {
        return None;
    }
    let n = clean.len() as f64;
    let mean = clean.iter().sum::<f64>() / n;
    let max = clean.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = clean.iter().copied().fold(f64::INFINITY, f64::min);
    let std = if clean.len() < 2 {
        None
    } else {
        let var = clean.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(var.sqrt())
    };
    Some(ChannelStats { max, mean, min, std })
}

/// Advisory plausibility report for one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrradianceCheck {
    pub valid: bool,
    pub issues: Vec<String>,
}

/// Flag negative values, values above physical bounds and an inconsistent
/// `ghi / (dni + dhi)` ratio. Never fails.
pub fn validate_irradiance(ghi: f64, dni: f64, dhi: f64) -> IrradianceCheck {
    let mut issues = Vec::new();
    for (name, value) in [("GHI", ghi), ("DNI", dni), ("DHI", dhi)] {
        if value < 0.0 {
            issues.push(format!("{} is negative", name));
        }
    }
    for (name, value, max) in [("GHI", ghi, MAX_GHI), ("DNI", dni, MAX_DNI), ("DHI", dhi, MAX_DHI)] {
        if value > max {
            issues.push(format!("{} too high ({:.0} W/m²)", name, value));
        }
    }
    if ghi > 0.0 && dni + dhi > 0.0 {
        let ratio = ghi / (dni + dhi);
        if !RATIO_RANGE.contains(&ratio) {
            issues.push(format!("Inconsistent GHI/DNI/DHI relationship (ratio: {:.2})", ratio));
        }
    }
    IrradianceCheck {
        valid: issues.is_empty(),
        issues,
    }
}

/// Irradiance samples aligned with a position series.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceSeries {
    pub samples: Vec<IrradianceSample>,
    pub statistics: IrradianceStatistics,
}

impl IrradianceSeries {
    /// Daily GHI total in kWh/m².
    pub fn total_irradiance(&self) -> f64 {
        self.statistics.daily_totals.ghi
    }
}

/// Evaluate the clear-sky model over the series timestamps and assemble
/// per-instant samples, PAR and plane-of-array values.
pub fn build(
    engine: &dyn AstronomicalEngine,
    location: &Location,
    positions: &PositionSeries,
    model: ClearSkyModel,
    include_par: bool,
    surface: Option<&Surface>,
    interval_hours: f64,
) -> Result<IrradianceSeries> {
    let raw = engine.clear_sky(location, &positions.timestamps, model)?;
    if raw.len() != positions.timestamps.len() {
        error!(
            "engine returned {} clear-sky samples for {} timestamps",
            raw.len(),
            positions.timestamps.len()
        );
        return Err(SunpathError::UpstreamDataMissing(format!(
            "expected {} clear-sky samples, got {}",
            positions.timestamps.len(),
            raw.len()
        )));
    }

    let mut flagged = 0;
    let samples: Vec<IrradianceSample> = raw
        .iter()
        .zip(&positions.positions)
        .zip(&positions.timestamps)
        .map(|((sky, sun), ts)| {
            let check = validate_irradiance(sky.ghi, sky.dni, sky.dhi);
            if !check.valid {
                flagged += 1;
                debug!("{}: {}", ts, check.issues.join("; "));
            }
            IrradianceSample {
                ghi: sky.ghi,
                dni: sky.dni,
                dhi: sky.dhi,
                par: if include_par { finite(par(sky.ghi)) } else { None },
                poa: surface.map(|s| engine.plane_of_array(sky, sun, s)),
            }
        })
        .collect();
    if flagged > 0 {
        warn!("{} of {} irradiance samples failed plausibility checks", flagged, samples.len());
    }

    let channel = |f: fn(&ClearSkySample) -> f64| {
        let values: Vec<f64> = raw.iter().map(f).collect();
        channel_stats(&values)
    };
    let statistics = IrradianceStatistics {
        ghi: channel(|s| s.ghi),
        dni: channel(|s| s.dni),
        dhi: channel(|s| s.dhi),
        daily_totals: daily_totals(&raw, interval_hours),
        flagged_instants: flagged,
    };

    Ok(IrradianceSeries { samples, statistics })
}
