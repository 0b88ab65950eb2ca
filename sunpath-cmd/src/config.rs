//! Runtime settings, read from flags with environment fallbacks.

use clap::Args;
use log::{info, warn};
use std::path::PathBuf;
use sunpath_core::engine::{STANDARD_PRESSURE_HPA, STANDARD_TEMPERATURE_C};
use sunpath_core::request::DEFAULT_MAX_OBJECT_HEIGHT;
use sunpath_core::RequestDefaults;
use sunpath_db::Cache;

/// Six hours
pub const DEFAULT_CACHE_TTL_SECS: u64 = 21_600;

pub const DEFAULT_BATCH_WORKERS: usize = 4;

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Lifetime of cached calculation results, seconds
    #[arg(long = "cache-ttl", env = "SUNPATH_CACHE_TTL", default_value_t = DEFAULT_CACHE_TTL_SECS, global = true)]
    pub cache_ttl_secs: u64,

    /// SQLite file for the cache; in-memory when unset
    #[arg(long, env = "SUNPATH_CACHE_PATH", global = true)]
    pub cache_path: Option<PathBuf>,

    /// Skip the cache entirely
    #[arg(long, env = "SUNPATH_NO_CACHE", global = true)]
    pub no_cache: bool,

    /// Pressure for refraction correction when a request has none, hPa
    #[arg(long, env = "SUNPATH_DEFAULT_PRESSURE", default_value_t = STANDARD_PRESSURE_HPA, global = true)]
    pub default_pressure: f64,

    /// Temperature for refraction correction when a request has none, °C
    #[arg(long, env = "SUNPATH_DEFAULT_TEMPERATURE", default_value_t = STANDARD_TEMPERATURE_C, global = true)]
    pub default_temperature: f64,

    /// Tallest object accepted for shadow calculations, meters
    #[arg(long, env = "SUNPATH_MAX_OBJECT_HEIGHT", default_value_t = DEFAULT_MAX_OBJECT_HEIGHT, global = true)]
    pub max_object_height: f64,

    /// Concurrent calculations in a parallel batch
    #[arg(long, env = "SUNPATH_BATCH_WORKERS", default_value_t = DEFAULT_BATCH_WORKERS, global = true)]
    pub batch_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_path: None,
            no_cache: false,
            default_pressure: STANDARD_PRESSURE_HPA,
            default_temperature: STANDARD_TEMPERATURE_C,
            max_object_height: DEFAULT_MAX_OBJECT_HEIGHT,
            batch_workers: DEFAULT_BATCH_WORKERS,
        }
    }
}

impl Settings {
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            max_object_height: self.max_object_height,
            pressure: self.default_pressure,
            temperature: self.default_temperature,
        }
    }

    /// Open the configured cache store and drop its expired entries. A store
    /// that cannot be opened is replaced by a disabled cache so calculations
    /// still run.
    pub fn open_cache(&self) -> Cache {
        if self.no_cache {
            return Cache::disabled();
        }
        let opened = match &self.cache_path {
            Some(path) => Cache::open(path),
            None => Cache::in_memory(),
        };
        match opened {
            Ok(cache) => {
                let purged = cache.purge_expired();
                if purged > 0 {
                    info!("purged {} expired cache entries", purged);
                }
                cache
            }
            Err(e) => {
                warn!("cache store unavailable, computing without it: {}", e);
                Cache::disabled()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn defaults_match_flags() {
        let parsed = TestCli::try_parse_from(["sunpath"]).unwrap().settings;
        let defaults = Settings::default();
        assert_eq!(parsed.cache_ttl_secs, defaults.cache_ttl_secs);
        assert_eq!(parsed.batch_workers, 4);
        assert_eq!(parsed.default_pressure, 1013.25);
        assert!(!parsed.no_cache);
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = TestCli::try_parse_from(["sunpath", "--cache-ttl", "60", "--max-object-height", "50"])
            .unwrap()
            .settings;
        assert_eq!(parsed.cache_ttl_secs, 60);
        assert_eq!(parsed.request_defaults().max_object_height, 50.0);
    }

    #[test]
    fn no_cache_yields_disabled_store() {
        let settings = Settings {
            no_cache: true,
            ..Settings::default()
        };
        assert!(!settings.open_cache().is_available());
        assert!(Settings::default().open_cache().is_available());
    }
}
