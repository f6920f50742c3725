//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden from the environment (see the getters below).

use std::time::Duration;

/// Default SQLite file for the prediction cache
pub const DEFAULT_DATABASE_PATH: &str = "predictions.db";

/// Default rolling window capacity for every metrics window
pub const DEFAULT_METRICS_CAPACITY: usize = 1000;

/// Default system sampling interval (seconds)
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 30;

/// Interval used after repeated sampling failures (seconds)
pub const DEFAULT_METRICS_BACKOFF_SECS: u64 = 60;

/// Default retention for `cleanup-cache` (days)
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

// Feature validation bounds
pub const MIN_BATTERY_POWER: f64 = 0.0;
pub const MAX_BATTERY_POWER: f64 = 10_000.0;
pub const MIN_CLOCK_SPEED: f64 = 0.0;
pub const MAX_CLOCK_SPEED: f64 = 10.0;
pub const MIN_RAM: f64 = 0.0;
pub const MAX_RAM: f64 = 100_000.0;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Mobile Price Predictor";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Get cache database path from environment or use default
pub fn get_database_path() -> String {
    std::env::var("DATABASE_PATH")
        .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string())
}

/// Get metrics window capacity from environment or use default
pub fn get_metrics_capacity() -> usize {
    env_parse("METRICS_CAPACITY")
        .filter(|c| *c > 0)
        .unwrap_or(DEFAULT_METRICS_CAPACITY)
}

/// Get sampling interval from environment or use default
pub fn get_metrics_interval() -> Duration {
    Duration::from_secs(
        env_parse("METRICS_INTERVAL_SECS")
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_METRICS_INTERVAL_SECS),
    )
}

/// Get sampling backoff interval from environment or use default
pub fn get_metrics_backoff() -> Duration {
    Duration::from_secs(
        env_parse("METRICS_BACKOFF_SECS")
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_METRICS_BACKOFF_SECS),
    )
}

/// Inclusive bounds for one validated field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Range checks applied on top of the non-negativity rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationLimits {
    pub battery_power: Bounds,
    pub clock_speed: Bounds,
    pub ram: Bounds,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            battery_power: Bounds::new(MIN_BATTERY_POWER, MAX_BATTERY_POWER),
            clock_speed: Bounds::new(MIN_CLOCK_SPEED, MAX_CLOCK_SPEED),
            ram: Bounds::new(MIN_RAM, MAX_RAM),
        }
    }
}

impl ValidationLimits {
    /// Load limits from environment, falling back to the compiled defaults
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            battery_power: Bounds::new(
                env_parse("MIN_BATTERY_POWER").unwrap_or(d.battery_power.min),
                env_parse("MAX_BATTERY_POWER").unwrap_or(d.battery_power.max),
            ),
            clock_speed: Bounds::new(
                env_parse("MIN_CLOCK_SPEED").unwrap_or(d.clock_speed.min),
                env_parse("MAX_CLOCK_SPEED").unwrap_or(d.clock_speed.max),
            ),
            ram: Bounds::new(
                env_parse("MIN_RAM").unwrap_or(d.ram.min),
                env_parse("MAX_RAM").unwrap_or(d.ram.max),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ValidationLimits::default();
        assert!(limits.battery_power.contains(1000.0));
        assert!(!limits.battery_power.contains(10_001.0));
        assert!(limits.clock_speed.contains(10.0));
        assert!(!limits.ram.contains(100_000.5));
    }

    #[test]
    fn test_zero_metrics_intervals_fall_back_to_defaults() {
        std::env::set_var("METRICS_INTERVAL_SECS", "0");
        std::env::set_var("METRICS_BACKOFF_SECS", "0");
        let interval = get_metrics_interval();
        let backoff = get_metrics_backoff();
        std::env::remove_var("METRICS_INTERVAL_SECS");
        std::env::remove_var("METRICS_BACKOFF_SECS");

        assert_eq!(interval, Duration::from_secs(DEFAULT_METRICS_INTERVAL_SECS));
        assert_eq!(backoff, Duration::from_secs(DEFAULT_METRICS_BACKOFF_SECS));
    }
}
