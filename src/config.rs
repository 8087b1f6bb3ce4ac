//! Runtime configuration from environment variables
//!
//! `.env` is loaded by the binary (dotenv) before `Config::from_env()` runs.

use crate::error::ConfigError;
use std::env;
use std::time::Duration;

pub const DEFAULT_WINDOW_DEPTH: usize = 50;
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
pub const DEFAULT_REFRESH_MS: u64 = 100;
pub const DEFAULT_TOP_ROWS: usize = 20;
pub const DEFAULT_SERIAL_BAUD: u32 = 115_200;
pub const DEFAULT_SERIAL_TIMEOUT_MS: u64 = 1000;

/// Configuration for the ingestion engine and dashboard
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Samples retained per byte slot in each identifier's RollingStats
    pub window_depth: usize,

    /// Decoded records retained per identifier
    pub history_limit: usize,

    /// Dashboard redraw interval in milliseconds
    pub refresh_ms: u64,

    /// Rows shown in the dashboard tables
    pub top_rows: usize,

    pub serial_baud: u32,
    pub serial_timeout_ms: u64,

    pub rust_log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_depth: DEFAULT_WINDOW_DEPTH,
            history_limit: DEFAULT_HISTORY_LIMIT,
            refresh_ms: DEFAULT_REFRESH_MS,
            top_rows: DEFAULT_TOP_ROWS,
            serial_baud: DEFAULT_SERIAL_BAUD,
            serial_timeout_ms: DEFAULT_SERIAL_TIMEOUT_MS,
            rust_log: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `CANFLOW_WINDOW_DEPTH` (default: 50)
    /// - `CANFLOW_HISTORY_LIMIT` (default: 1000)
    /// - `CANFLOW_REFRESH_MS` (default: 100)
    /// - `CANFLOW_TOP_ROWS` (default: 20)
    /// - `CANFLOW_SERIAL_BAUD` (default: 115200)
    /// - `CANFLOW_SERIAL_TIMEOUT_MS` (default: 1000)
    /// - `RUST_LOG` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            window_depth: parse_or(&lookup, "CANFLOW_WINDOW_DEPTH", DEFAULT_WINDOW_DEPTH),
            history_limit: parse_or(&lookup, "CANFLOW_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT),
            refresh_ms: parse_or(&lookup, "CANFLOW_REFRESH_MS", DEFAULT_REFRESH_MS),
            top_rows: parse_or(&lookup, "CANFLOW_TOP_ROWS", DEFAULT_TOP_ROWS),
            serial_baud: parse_or(&lookup, "CANFLOW_SERIAL_BAUD", DEFAULT_SERIAL_BAUD),
            serial_timeout_ms: parse_or(
                &lookup,
                "CANFLOW_SERIAL_TIMEOUT_MS",
                DEFAULT_SERIAL_TIMEOUT_MS,
            ),
            rust_log: lookup("RUST_LOG"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_depth == 0 {
            return Err(ConfigError::InvalidValue(
                "CANFLOW_WINDOW_DEPTH must be greater than 0".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "CANFLOW_HISTORY_LIMIT must be greater than 0".to_string(),
            ));
        }
        if self.refresh_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "CANFLOW_REFRESH_MS must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn serial_timeout(&self) -> Duration {
        Duration::from_millis(self.serial_timeout_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Invalid {} '{}', defaulting to {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.window_depth, 50);
        assert_eq!(config.serial_baud, 115_200);
        assert_eq!(config.refresh_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_custom_config() {
        let config = Config::from_lookup(lookup_from(&[
            ("CANFLOW_WINDOW_DEPTH", "10"),
            ("CANFLOW_HISTORY_LIMIT", "25"),
            ("CANFLOW_REFRESH_MS", "250"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.window_depth, 10);
        assert_eq!(config.history_limit, 25);
        assert_eq!(config.refresh_ms, 250);
        assert_eq!(config.rust_log.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unparseable_value_falls_back() {
        let config =
            Config::from_lookup(lookup_from(&[("CANFLOW_TOP_ROWS", "many")])).unwrap();
        assert_eq!(config.top_rows, DEFAULT_TOP_ROWS);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let result = Config::from_lookup(lookup_from(&[("CANFLOW_WINDOW_DEPTH", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }
}
