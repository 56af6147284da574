//! Reconnection Backoff
//!
//! Exponential backoff for WebSocket reconnection: the delay starts at
//! the floor, strictly doubles after every unsuccessful cycle, is
//! capped at the ceiling, and resets to the floor once the venue
//! positively acknowledges a subscription. This bounds reconnection
//! storms while recovering quickly from transient outages.

use std::time::Duration;

/// Configuration for reconnection backoff.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Ceiling for the doubled delay.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffConfig {
    /// Create a configuration with custom bounds.
    #[must_use]
    pub const fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
        }
    }
}

/// Exponential backoff state for one connection loop.
#[derive(Debug)]
pub struct BackoffPolicy {
    config: BackoffConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl BackoffPolicy {
    /// Create a policy at the floor delay.
    #[must_use]
    pub const fn new(config: BackoffConfig) -> Self {
        let initial_delay = config.initial_delay;
        Self {
            config,
            current_delay: initial_delay,
            attempt_count: 0,
        }
    }

    /// Delay to wait before the next reconnection attempt.
    ///
    /// Returns the current interval and doubles it (capped at the
    /// ceiling) for the cycle after this one.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt_count += 1;
        let delay = self.current_delay;
        self.current_delay = (self.current_delay * 2).min(self.config.max_delay);
        delay
    }

    /// Reset to the floor after a confirmed subscription acknowledgment.
    pub const fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.attempt_count = 0;
    }

    /// Reconnection attempts since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}
