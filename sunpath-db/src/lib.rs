//! SQLite-backed cache for calculation results.
//!
//! The cache is best effort: every store failure is logged, counted and
//! swallowed so callers fall back to computing the value directly. Entries
//! carry an absolute expiry time and are invisible once it has passed.
//!
//! # Usage
//!
//! ```rust
//! use sunpath_db::{Cache, CacheKey};
//!
//! let cache = Cache::in_memory().unwrap();
//! let key = CacheKey::new("sun_times").coordinate("lat", 37.5665).build();
//!
//! assert!(cache.get(&key).is_none());
//! assert!(cache.set(&key, "{\"ok\":true}", 60));
//! assert_eq!(cache.get(&key).as_deref(), Some("{\"ok\":true}"));
//! assert_eq!(cache.stats().hits, 1);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the SQL schema.

pub mod key;
pub mod models;
pub mod schema;
mod store;

pub use key::CacheKey;
pub use models::CacheStats;

use log::{info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use sunpath_core::SunpathError;

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

/// Handle to the cache store.
///
/// Cheaply cloneable and shareable across threads; clones share the same
/// connection and counters.
#[derive(Clone)]
pub struct Cache {
    conn: Option<Arc<Mutex<Connection>>>,
    counters: Arc<Counters>,
}

impl Cache {
    /// In-memory store with the schema applied.
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    /// File-backed store at `path`, created if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("opened cache store at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    /// A cache that stores nothing and reports itself unavailable.
    pub fn disabled() -> Self {
        Self {
            conn: None,
            counters: Arc::default(),
        }
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Some(Arc::new(Mutex::new(conn))),
            counters: Arc::default(),
        })
    }

    /// Ping the store.
    pub fn is_available(&self) -> bool {
        let result = self.connection().and_then(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(unavailable)
        });
        result.is_ok()
    }

    fn connection(&self) -> sunpath_core::Result<MutexGuard<'_, Connection>> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| SunpathError::CacheUnavailable("cache disabled".into()))?;
        conn.lock()
            .map_err(|_| SunpathError::CacheUnavailable("connection lock poisoned".into()))
    }

    fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    fn record_hit(&self) {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, op: &str, err: &SunpathError) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        warn!("cache {} failed: {}", op, err);
    }
}

fn unavailable(err: rusqlite::Error) -> SunpathError {
    SunpathError::CacheUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_cache_is_available() {
        let cache = Cache::in_memory().unwrap();
        assert!(cache.is_available());
    }

    #[test]
    fn disabled_cache_is_unavailable() {
        let cache = Cache::disabled();
        assert!(!cache.is_available());
        assert!(cache.get("anything").is_none());
        assert!(!cache.set("anything", "1", 60));
        let stats = cache.stats();
        assert!(!stats.available);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn clones_share_counters() {
        let cache = Cache::in_memory().unwrap();
        let other = cache.clone();
        other.set("k", "v", 60);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert_eq!(other.stats().hits, 1);
    }

    #[test]
    fn file_store_persists_between_handles() {
        let path = std::env::temp_dir().join(format!("sunpath-cache-{}.db", std::process::id()));
        {
            let cache = Cache::open(&path).unwrap();
            assert!(cache.set("persist", "yes", 60));
        }
        let reopened = Cache::open(&path).unwrap();
        assert_eq!(reopened.get("persist").as_deref(), Some("yes"));
        drop(reopened);
        let _ = std::fs::remove_file(&path);
    }
}
