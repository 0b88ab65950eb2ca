//! Extrema and contiguous high-value periods over an assembled series.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use sunpath_core::SeriesPoint;
use sunpath_utils::dates::format_hhmm;

/// GHI above which an instant is good for solar collection, W/m²
pub const COLLECTION_GHI_THRESHOLD: f64 = 600.0;

/// Shadow length above which an instant counts as interference, meters
pub const INTERFERENCE_SHADOW_THRESHOLD: f64 = 10.0;

/// Largest gap between candidates that still belong to one period, minutes
pub const MERGE_GAP_MINUTES: u32 = 120;

/// A notable instant of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakInstant {
    /// Local `HH:MM`
    pub time: String,
    pub altitude: f64,
    pub ghi: Option<f64>,
    pub shadow_length: Option<f64>,
}

/// A run of candidate instants with no gap over [`MERGE_GAP_MINUTES`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start: String,
    pub end: String,
    pub duration_hours: f64,
    /// Mean GHI for collection periods, mean shadow length for interference periods
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub max_irradiance: Option<PeakInstant>,
    pub max_altitude: Option<PeakInstant>,
    pub min_shadow: Option<PeakInstant>,
    /// Longest optimal collection period, the earliest on ties
    pub longest_collection_period: Option<Period>,
    pub optimal_collection_periods: Vec<Period>,
    pub shadow_interference_periods: Vec<Period>,
}

struct Candidate {
    minutes: u32,
    time: String,
    value: f64,
}

fn peak(point: &SeriesPoint, time: &str) -> PeakInstant {
    PeakInstant {
        time: time.to_string(),
        altitude: point.sun.altitude,
        ghi: point.ghi(),
        shadow_length: point.shadow_length(),
    }
}

/// Scan the series once for its extrema and candidate instants, then merge
/// the candidates into periods.
///
/// Times are compared as minutes since local midnight, so the series is
/// assumed to lie within one calendar day.
pub fn analyze(series: &[SeriesPoint]) -> OptimizationResult {
    let mut max_ghi: Option<(f64, PeakInstant)> = None;
    let mut max_alt: Option<(f64, PeakInstant)> = None;
    let mut min_shadow: Option<(f64, PeakInstant)> = None;
    let mut collection = Vec::new();
    let mut interference = Vec::new();

    for point in series {
        let local = point.timestamp.time();
        let time = format_hhmm(&local);
        let minutes = local.hour() * 60 + local.minute();

        if let Some(ghi) = point.ghi() {
            if ghi > 0.0 && max_ghi.as_ref().map_or(true, |(best, _)| ghi > *best) {
                max_ghi = Some((ghi, peak(point, &time)));
            }
            if ghi > COLLECTION_GHI_THRESHOLD {
                collection.push(Candidate {
                    minutes,
                    time: time.clone(),
                    value: ghi,
                });
            }
        }

        let altitude = point.sun.altitude;
        if altitude.is_finite() && max_alt.as_ref().map_or(true, |(best, _)| altitude > *best) {
            max_alt = Some((altitude, peak(point, &time)));
        }

        if let Some(length) = point.shadow_length() {
            if length > 0.0 && min_shadow.as_ref().map_or(true, |(best, _)| length < *best) {
                min_shadow = Some((length, peak(point, &time)));
            }
            if length > INTERFERENCE_SHADOW_THRESHOLD {
                interference.push(Candidate {
                    minutes,
                    time,
                    value: length,
                });
            }
        }
    }

    let optimal_collection_periods = merge_periods(collection);
    let mut longest_collection_period: Option<&Period> = None;
    for period in &optimal_collection_periods {
        if longest_collection_period.map_or(true, |best| period.duration_hours > best.duration_hours) {
            longest_collection_period = Some(period);
        }
    }
    let longest_collection_period = longest_collection_period.cloned();

    OptimizationResult {
        max_irradiance: max_ghi.map(|(_, p)| p),
        max_altitude: max_alt.map(|(_, p)| p),
        min_shadow: min_shadow.map(|(_, p)| p),
        longest_collection_period,
        optimal_collection_periods,
        shadow_interference_periods: merge_periods(interference),
    }
}

fn merge_periods(mut candidates: Vec<Candidate>) -> Vec<Period> {
    candidates.sort_by_key(|c| c.minutes);
    let mut periods = Vec::new();
    let mut run: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if let Some(last) = run.last() {
            if candidate.minutes - last.minutes > MERGE_GAP_MINUTES {
                periods.push(close_run(&run));
                run.clear();
            }
        }
        run.push(candidate);
    }
    if !run.is_empty() {
        periods.push(close_run(&run));
    }
    periods
}

fn close_run(run: &[Candidate]) -> Period {
    let first = &run[0];
    let last = &run[run.len() - 1];
    Period {
        start: first.time.clone(),
        end: last.time.clone(),
        duration_hours: f64::from(last.minutes - first.minutes) / 60.0,
        average: run.iter().map(|c| c.value).sum::<f64>() / run.len() as f64,
    }
}
