//! Deterministic cache keys derived from calculation parameters.

use sha3::{Digest, Sha3_256};
use std::fmt::Display;
use sunpath_utils::numbers::format_coordinate;

/// Keys longer than this are replaced by a hash under the same prefix.
pub const MAX_KEY_LENGTH: usize = 200;

/// Builder for a cache key: a prefix plus `name:value` pairs.
///
/// Pairs are sorted by name before joining so the key does not depend on the
/// order parameters were added in. Absent values are skipped.
///
/// ```rust
/// use sunpath_db::CacheKey;
///
/// let key = CacheKey::new("sun_position")
///     .coordinate("lon", 126.978)
///     .coordinate("lat", 37.5665)
///     .field("date", "2025-06-21")
///     .build();
/// assert_eq!(key, "sun_position_date:2025-06-21_lat:37.5665_lon:126.978");
/// ```
#[derive(Debug, Clone)]
pub struct CacheKey {
    prefix: String,
    pairs: Vec<(String, String)>,
}

impl CacheKey {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            pairs: Vec::new(),
        }
    }

    /// Add a coordinate, written with at most six decimals.
    pub fn coordinate(mut self, name: &str, value: f64) -> Self {
        self.pairs.push((name.to_string(), format_coordinate(value)));
        self
    }

    pub fn field(mut self, name: &str, value: impl Display) -> Self {
        self.pairs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn field_opt<T: Display>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    pub fn build(mut self) -> String {
        self.pairs.sort();
        let mut key = self.prefix.clone();
        for (name, value) in &self.pairs {
            key.push('_');
            key.push_str(name);
            key.push(':');
            key.push_str(value);
        }
        if key.len() > MAX_KEY_LENGTH {
            let hash = Sha3_256::digest(key.as_bytes());
            return format!("{}:{:x}", self.prefix, hash);
        }
        key
    }
}
