//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present). CLI flags override them.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default number of parse results kept by the ingest cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Regions selected when the caller does not choose any.
pub const DEFAULT_REGION_COUNT: usize = 5;

/// Rows shown in the data preview.
pub const PREVIEW_ROWS: usize = 5;

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `POPSTAT_PORT`
    pub port: u16,
    /// `POPSTAT_CACHE_CAPACITY`
    pub cache_capacity: usize,
    /// `POPSTAT_DEFAULT_REGIONS`
    pub default_regions: usize,
    /// `POPSTAT_FETCH_TIMEOUT_SECS`; `None` keeps the HTTP client default.
    pub fetch_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            default_regions: DEFAULT_REGION_COUNT,
            fetch_timeout: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Unset or unparseable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or(&lookup, "POPSTAT_PORT", defaults.port),
            cache_capacity: parse_or(&lookup, "POPSTAT_CACHE_CAPACITY", defaults.cache_capacity),
            default_regions: parse_or(&lookup, "POPSTAT_DEFAULT_REGIONS", defaults.default_regions),
            fetch_timeout: lookup("POPSTAT_FETCH_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_values_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("POPSTAT_PORT", "8080"),
            ("POPSTAT_CACHE_CAPACITY", "2"),
            ("POPSTAT_DEFAULT_REGIONS", "oops"),
            ("POPSTAT_FETCH_TIMEOUT_SECS", "30"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_capacity, 2);
        assert_eq!(config.default_regions, DEFAULT_REGION_COUNT);
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(30)));
    }
}
