use std::time::Duration;

use crate::error::ControllerError;

/// Shortest period the loop timer is ever scheduled with.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Timing knobs of the trading loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Cadence of status evaluation while armed.
    pub tick_interval: Duration,

    /// Delay between `start` and the first arming, giving the order book
    /// time to accumulate history.
    pub warmup: Duration,

    /// Statistics fetches slower than this are reported under `performance`.
    pub slow_fetch_threshold: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            warmup: Duration::from_secs(60),
            slow_fetch_threshold: Duration::from_secs(5),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.tick_interval.is_zero() {
            return Err(ControllerError::InvalidConfig("tick_interval must be non-zero"));
        }
        Ok(())
    }

    /// Period handed to the timer, never below [`MIN_TICK_INTERVAL`].
    pub fn tick_period(&self) -> Duration {
        self.tick_interval.max(MIN_TICK_INTERVAL)
    }
}
