//! SQL schema for the cache store.

/// Returns the cache schema as a single batch string.
///
/// - `cache_entries` - serialized payload per key, with an optional unix
///   expiry time (`NULL` never expires)
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS cache_entries (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        expires_at INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache_entries(expires_at);
    "#
}
