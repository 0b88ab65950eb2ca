use crate::{unavailable, Cache, CacheStats};
use chrono::Utc;
use log::{debug, info, warn};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::Ordering;
use sunpath_core::error::Result;
use sunpath_core::SunpathError;

/// Accepted length of a `clear_pattern` glob, in characters.
pub const PATTERN_LENGTH: std::ops::RangeInclusive<usize> = 1..=100;

/// Absolute unix expiry for a TTL starting at `now`.
fn expiry(now: i64, ttl_secs: u64) -> Option<i64> {
    if ttl_secs == 0 {
        return None;
    }
    i64::try_from(ttl_secs).ok().and_then(|ttl| now.checked_add(ttl))
}

impl Cache {
    /// Fetch a live entry. Misses, expired entries and store failures all
    /// read as `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        match self.try_get(key) {
            Ok(Some(value)) => {
                self.record_hit();
                info!("cache hit: {}", key);
                Some(value)
            }
            Ok(None) => {
                self.record_miss();
                info!("cache miss: {}", key);
                None
            }
            Err(e) => {
                self.record_error("get", &e);
                None
            }
        }
    }

    fn try_get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT value FROM cache_entries
             WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
            params![key, Utc::now().timestamp()],
            |row| row.get(0),
        )
        .optional()
        .map_err(unavailable)
    }

    /// Store `value` for `ttl_secs` seconds, replacing any previous entry.
    /// A zero TTL, or one too large to represent, stores the entry without
    /// expiry.
    ///
    /// Returns whether the value was stored.
    pub fn set(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        self.set_with_expiry(key, value, expiry(Utc::now().timestamp(), ttl_secs))
    }

    pub(crate) fn set_with_expiry(&self, key: &str, value: &str, expires_at: Option<i64>) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let result = self.connection().and_then(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)",
                params![key, value, expires_at],
            )
            .map_err(unavailable)
        });
        match result {
            Ok(_) => {
                debug!("cached {} ({} bytes)", key, value.len());
                true
            }
            Err(e) => {
                self.record_error("set", &e);
                false
            }
        }
    }

    /// Remove one entry. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let result = self.connection().and_then(|conn| {
            conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
                .map_err(unavailable)
        });
        match result {
            Ok(n) => n > 0,
            Err(e) => {
                self.record_error("delete", &e);
                false
            }
        }
    }

    /// Remove every entry whose key matches a glob (`*`, `?` and `[...]`).
    ///
    /// An empty or over-long pattern is rejected; store failures count as
    /// zero removed entries.
    pub fn clear_pattern(&self, pattern: &str) -> Result<usize> {
        let length = pattern.chars().count();
        if !PATTERN_LENGTH.contains(&length) {
            return Err(SunpathError::InvalidInput(format!(
                "pattern must be {} to {} characters, got {}",
                PATTERN_LENGTH.start(),
                PATTERN_LENGTH.end(),
                length
            )));
        }
        if !self.is_enabled() {
            return Ok(0);
        }
        let result = self.connection().and_then(|conn| {
            conn.execute("DELETE FROM cache_entries WHERE key GLOB ?1", params![pattern])
                .map_err(unavailable)
        });
        match result {
            Ok(n) => {
                info!("cleared {} cache entries matching {}", n, pattern);
                Ok(n)
            }
            Err(e) => {
                self.record_error("clear", &e);
                Ok(0)
            }
        }
    }

    /// Drop entries whose expiry has passed.
    pub fn purge_expired(&self) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        let result = self.connection().and_then(|conn| {
            conn.execute(
                "DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![Utc::now().timestamp()],
            )
            .map_err(unavailable)
        });
        match result {
            Ok(n) => n,
            Err(e) => {
                self.record_error("purge", &e);
                0
            }
        }
    }

    fn live_entries(&self) -> Result<u64> {
        let conn = self.connection()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM cache_entries WHERE expires_at IS NULL OR expires_at > ?1",
                params![Utc::now().timestamp()],
                |row| row.get(0),
            )
            .map_err(unavailable)?;
        Ok(count.max(0) as u64)
    }

    pub fn stats(&self) -> CacheStats {
        let available = self.is_available();
        let entries = if available {
            self.live_entries().unwrap_or_else(|e| {
                self.record_error("stats", &e);
                0
            })
        } else {
            0
        };
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        CacheStats {
            available,
            hits,
            misses,
            errors: self.counters.errors.load(Ordering::Relaxed),
            hit_rate: CacheStats::hit_rate(hits, misses),
            entries,
        }
    }

    /// [`Cache::get`] followed by JSON decoding. An undecodable entry is
    /// dropped and reads as a miss.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("dropping undecodable cache entry {}: {}", key, e);
                self.delete(key);
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl_secs),
            Err(e) => {
                self.record_error("encode", &SunpathError::from(e));
                false
            }
        }
    }
}
