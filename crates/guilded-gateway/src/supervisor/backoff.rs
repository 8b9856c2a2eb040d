//! Linear reconnect backoff

use std::time::Duration;

/// Delay before the k-th consecutive reconnect attempt is `base * k`
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(base: Duration) -> Self {
        Self { base, attempts: 0 }
    }

    /// Count an attempt and return the delay to wait before it
    pub fn next_delay(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.base.saturating_mul(self.attempts)
    }

    /// Back to `base` after a healthy poll
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn base(&self) -> Duration {
        self.base
    }
}
