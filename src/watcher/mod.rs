//! Change detection watcher
//!
//! One perpetual background task polls the configured source for
//! modification and pushes detected changes through the engine. The loop
//! never exits before process shutdown: every error is logged, the sleep
//! doubles, and a later tick tries again. Ticks where auto-refresh is
//! disabled, no source is configured, or the interval has not elapsed are
//! free: they neither fetch nor touch the backoff.

mod backoff;
mod gate;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::Engine;

pub use backoff::Backoff;
pub use gate::CheckGate;

/// Watcher loop tuning
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Sleep between ticks when healthy
    pub tick: Duration,

    /// Ceiling for the error backoff
    pub max_backoff: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Polls the engine's source and applies detected changes
pub struct UpdateWatcher {
    engine: Arc<Engine>,
    gate: CheckGate,
    backoff: Backoff,
}

impl UpdateWatcher {
    pub fn new(engine: Arc<Engine>, config: WatcherConfig) -> Self {
        Self {
            engine,
            gate: CheckGate::new(),
            backoff: Backoff::new(config.tick, config.max_backoff),
        }
    }

    /// Spawn the watcher as a background task
    pub fn spawn(engine: Arc<Engine>, config: WatcherConfig) -> JoinHandle<()> {
        let watcher = Self::new(engine, config);
        tokio::spawn(watcher.run())
    }

    /// Run until the process shuts down
    pub async fn run(mut self) {
        debug!("Change watcher started");
        loop {
            tokio::time::sleep(self.backoff.delay()).await;
            self.tick().await;
        }
    }

    async fn tick(&mut self) {
        let settings = self.engine.auto_refresh();
        if !settings.enabled || !self.engine.has_source() {
            return;
        }

        let interval = Duration::from_secs(settings.interval_secs);
        if !self.gate.ready(Instant::now(), interval) {
            return;
        }

        match self.engine.check_for_update().await {
            Ok(true) => {
                debug!("Watcher applied updated results");
                self.backoff.reset();
            }
            Ok(false) => {
                debug!("No source changes detected");
                self.backoff.reset();
            }
            Err(e) => {
                self.backoff.failure();
                warn!(
                    error = %e,
                    retryable = e.is_retryable(),
                    next_delay_secs = self.backoff.delay().as_secs(),
                    "Watcher tick failed; backing off"
                );
            }
        }
    }
}
