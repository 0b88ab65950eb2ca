//! Serializable views of the cache state.

use serde::{Deserialize, Serialize};

/// Session counters and availability of the cache store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub available: bool,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    /// Percentage of lookups that hit, 0 when there were none
    pub hit_rate: f64,
    /// Live (unexpired) entries, 0 when the store is unavailable
    pub entries: u64,
}

impl CacheStats {
    pub fn hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64 * 100.0
        }
    }
}
