//! Refresh cadence of the dynamic layer.

use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Fixed-interval polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingStrategy {
    interval: Duration,
    sync_init: bool,
}

impl PollingStrategy {
    /// Fails if `interval` is zero.
    pub fn new(interval: Duration, sync_init: bool) -> Result<Self> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "polling-interval".to_string(),
                message: "interval must be positive".to_string(),
            });
        }
        Ok(Self {
            interval,
            sync_init,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the first fetch happens inline before `start` returns.
    pub fn sync_init(&self) -> bool {
        self.sync_init
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_interval() {
        assert!(PollingStrategy::new(Duration::ZERO, true).is_err());

        let strategy = PollingStrategy::new(Duration::from_secs(30), false).unwrap();
        assert_eq!(strategy.interval(), Duration::from_secs(30));
        assert!(!strategy.sync_init());
    }
}
