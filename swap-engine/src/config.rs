//! Configuration for the swap engine

use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;

/// Seconds a quote stays executable
pub const QUOTE_VALIDITY_SECS: i64 = 60;

/// Grace period added to the validity window for request processing
pub const QUOTE_PROCESSING_MARGIN_SECS: i64 = 5;

/// Default number of fill checks before a leg is considered incomplete
pub const DEFAULT_FILL_POLL_ATTEMPTS: u32 = 10;

/// Default delay between fill checks in milliseconds
pub const DEFAULT_FILL_POLL_INTERVAL_MS: u64 = 250;

/// Configuration for quoting and execution
#[derive(Debug, Clone)]
pub struct SwapEngineConfig {
    /// Seconds a quote stays executable, excluding the processing margin
    pub quote_validity_secs: i64,
    /// Fill checks made for a leg that a later leg depends on
    pub fill_poll_attempts: u32,
    /// Delay between fill checks
    pub fill_poll_interval: StdDuration,
}

impl Default for SwapEngineConfig {
    fn default() -> Self {
        Self {
            quote_validity_secs: QUOTE_VALIDITY_SECS,
            fill_poll_attempts: DEFAULT_FILL_POLL_ATTEMPTS,
            fill_poll_interval: StdDuration::from_millis(DEFAULT_FILL_POLL_INTERVAL_MS),
        }
    }
}

impl SwapEngineConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            quote_validity_secs: env::var("QUOTE_VALIDITY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.quote_validity_secs),
            fill_poll_attempts: env::var("FILL_POLL_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fill_poll_attempts),
            fill_poll_interval: env::var("FILL_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(StdDuration::from_millis)
                .unwrap_or(defaults.fill_poll_interval),
        }
    }

    /// Create a new configuration with custom values
    pub fn new(quote_validity_secs: i64, fill_poll_attempts: u32, fill_poll_interval: StdDuration) -> Self {
        Self {
            quote_validity_secs,
            fill_poll_attempts,
            fill_poll_interval,
        }
    }

    /// Time between quote creation and expiry
    pub fn validity_window(&self) -> Duration {
        Duration::seconds(self.quote_validity_secs + QUOTE_PROCESSING_MARGIN_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_window_includes_margin() {
        assert_eq!(SwapEngineConfig::default().validity_window(), Duration::seconds(65));
    }
}
