//! Interval gate deciding when a poll is due
//!
//! Kept separate from the watcher loop so the timing rule is a pure
//! function of injected instants.

use std::time::{Duration, Instant};

/// Tracks the last source check and admits a new one per interval
#[derive(Debug, Default)]
pub struct CheckGate {
    last_check: Option<Instant>,
}

impl CheckGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a check is due at `now`; records the check when it is
    pub fn ready(&mut self, now: Instant, interval: Duration) -> bool {
        if let Some(last) = self.last_check {
            if now.duration_since(last) < interval {
                return false;
            }
        }
        self.last_check = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_check_is_always_due() {
        let mut gate = CheckGate::new();
        assert!(gate.ready(Instant::now(), Duration::from_secs(5)));
    }

    #[test]
    fn test_interval_gating() {
        let interval = Duration::from_secs(5);
        let start = Instant::now();
        let mut gate = CheckGate::new();

        assert!(gate.ready(start, interval));
        // Three seconds later: not due yet
        assert!(!gate.ready(start + Duration::from_secs(3), interval));
        // Six seconds after the first check: due again
        assert!(gate.ready(start + Duration::from_secs(6), interval));
    }

    #[test]
    fn test_denied_check_does_not_reset_the_clock() {
        let interval = Duration::from_secs(5);
        let start = Instant::now();
        let mut gate = CheckGate::new();

        assert!(gate.ready(start, interval));
        assert!(!gate.ready(start + Duration::from_secs(4), interval));
        // Still measured from the admitted check at t=0
        assert!(gate.ready(start + Duration::from_secs(5), interval));
    }
}
