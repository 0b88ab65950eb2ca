//! Daily summaries and descriptive statistics attached to a calculation.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Sun times, day length and daily peak values for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    pub solar_noon: Option<DateTime<FixedOffset>>,
    /// Hours of daylight; 24 under polar day, 0 under polar night
    pub day_length: f64,
    /// Highest apparent altitude over the sampled series, degrees
    pub max_altitude: Option<f64>,
    /// Trapezoidal daily GHI total in kWh/m²
    pub total_irradiance: Option<f64>,
}

/// Heuristic polar-region flags for a latitude and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtremeConditions {
    pub is_polar_region: bool,
    pub is_polar_day: bool,
    pub is_polar_night: bool,
    pub warning: Option<String>,
}

/// Integrated daily energy per channel, kWh/m².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub ghi: f64,
    pub dni: f64,
    pub dhi: f64,
}

/// max / mean / min / sample standard deviation of one irradiance channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub max: f64,
    pub mean: f64,
    pub min: f64,
    /// Absent with fewer than two samples
    pub std: Option<f64>,
}

/// Descriptive statistics across an irradiance series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrradianceStatistics {
    pub ghi: Option<ChannelStats>,
    pub dni: Option<ChannelStats>,
    pub dhi: Option<ChannelStats>,
    pub daily_totals: DailyTotals,
    /// Instants flagged by the plausibility check
    pub flagged_instants: usize,
}
