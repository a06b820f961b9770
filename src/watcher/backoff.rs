//! Exponential backoff for the watcher's inter-tick sleep

use std::time::Duration;

/// Doubling sleep policy: failures double the delay up to a cap, any
/// successful tick resets it to the base
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: base,
        }
    }

    /// Sleep to apply before the next tick
    pub fn delay(&self) -> Duration {
        self.current
    }

    /// Record a failed tick
    pub fn failure(&mut self) {
        self.current = (self.current * 2).min(self.max);
    }

    /// Record a successful tick
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}
