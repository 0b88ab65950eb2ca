use crate::series::SeriesPoint;
use crate::summary::{DailySummary, ExtremeConditions, IrradianceStatistics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal accuracy of the underlying models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    /// Sun position, degrees
    pub position: f64,
    /// Clear-sky irradiance, percent
    pub irradiance: f64,
}

impl Default for Accuracy {
    fn default() -> Self {
        Self {
            position: 0.05,
            irradiance: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub accuracy: Accuracy,
}

impl Metadata {
    /// Fresh metadata with a random request id stamped now.
    pub fn generate() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            version: VERSION.to_string(),
            accuracy: Accuracy::default(),
        }
    }
}

/// Result of one integrated calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub metadata: Metadata,
    pub summary: DailySummary,
    pub conditions: ExtremeConditions,
    pub statistics: Option<IrradianceStatistics>,
    pub series: Vec<SeriesPoint>,
}

/// Outcome of one request within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub success: bool,
    pub result: Option<CalculationResponse>,
    pub error: Option<String>,
}

impl BatchItem {
    pub fn succeeded(index: usize, result: CalculationResponse) -> Self {
        Self {
            index,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub total_requests: usize,
    pub successful: usize,
    pub failed: usize,
    pub processing_time_ms: u64,
    pub results: Vec<BatchItem>,
}

impl BatchResponse {
    /// Tally per-item outcomes. `results` must already be in request order.
    pub fn from_items(results: Vec<BatchItem>, processing_time_ms: u64) -> Self {
        let successful = results.iter().filter(|item| item.success).count();
        Self {
            total_requests: results.len(),
            successful,
            failed: results.len() - successful,
            processing_time_ms,
            results,
        }
    }
}
