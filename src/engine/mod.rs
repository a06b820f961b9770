//! Competition engine: the context object behind every action
//!
//! One [`Engine`] is constructed at startup and handed to the request
//! handlers and the change watcher; there is no ambient global state.
//! It owns the state store, the broadcast hub, the configured source and
//! its last-observed modification stamp, and the auto-refresh settings.
//!
//! Every fetch-parse-load sequence (manual load, manual refresh,
//! watcher-detected change) runs under one async lock, so two writers can
//! never interleave around a suspension point and silently discard each
//! other's result. Failed sequences leave both the live and the public
//! view exactly as they were.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hub::BroadcastHub;
use crate::models::{DisplayMode, Event, PublicView, ResultSet, Scope};
use crate::parser;
use crate::source::{build_client, SourceRef};
use crate::state::CompetitionState;

/// Smallest accepted auto-refresh interval, in seconds
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 5;

/// Auto-refresh switch and cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoRefreshSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

/// Acknowledgement for a completed load or refresh
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub discipline: Option<String>,
    pub category: Option<String>,
    pub count: usize,
}

/// Auto-refresh status for the operator console
#[derive(Debug, Clone, Serialize)]
pub struct RefreshStatus {
    pub enabled: bool,
    pub interval_secs: u64,
    pub source: Option<String>,
    pub last_modified: Option<String>,
    pub last_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct SourceSlot {
    current: Option<SourceRef>,
    last_modified: Option<String>,
}

/// The one context object owning all competition state transitions
pub struct Engine {
    state: Arc<CompetitionState>,
    hub: Arc<BroadcastHub>,
    client: Client,
    source: Mutex<SourceSlot>,
    auto_refresh: Mutex<AutoRefreshSettings>,
    last_check: Mutex<Option<DateTime<Utc>>>,
    /// Serializes every fetch-parse-load sequence
    ingest_lock: tokio::sync::Mutex<()>,
    default_display_limit: Option<usize>,
}

impl Engine {
    /// Build the engine and its state/hub pair from configuration
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let state = Arc::new(CompetitionState::new());
        let hub = Arc::new(BroadcastHub::new(Arc::clone(&state)));
        let client = build_client(Duration::from_secs(config.source.request_timeout_secs))?;

        let default_source = match &config.source.default_source {
            Some(raw) => Some(SourceRef::parse(raw).map_err(|e| Error::config(e.to_string()))?),
            None => None,
        };

        Ok(Arc::new(Self {
            state,
            hub,
            client,
            source: Mutex::new(SourceSlot {
                current: default_source,
                last_modified: None,
            }),
            auto_refresh: Mutex::new(AutoRefreshSettings {
                enabled: config.refresh.auto_refresh_enabled,
                interval_secs: config.refresh.interval_secs,
            }),
            last_check: Mutex::new(None),
            ingest_lock: tokio::sync::Mutex::new(()),
            default_display_limit: config.server.public_display_limit,
        }))
    }

    pub fn state(&self) -> &Arc<CompetitionState> {
        &self.state
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, SourceSlot> {
        self.source.lock().expect("source slot lock poisoned")
    }

    /// Load results from the given source (or the configured one)
    ///
    /// On success the source becomes current for refresh and the watcher.
    pub async fn load(&self, source: Option<SourceRef>) -> Result<LoadSummary> {
        let source = match source.or_else(|| self.slot().current.clone()) {
            Some(s) => s,
            None => return Err(Error::validation("No source given and none configured")),
        };

        let results = self.ingest(&source).await?;
        Ok(LoadSummary {
            discipline: results.discipline.clone(),
            category: results.category.clone(),
            count: results.competitors.len(),
        })
    }

    /// Re-fetch and re-parse the current source
    pub async fn refresh(&self) -> Result<LoadSummary> {
        let source = self
            .slot()
            .current
            .clone()
            .ok_or_else(|| Error::validation("No data source loaded"))?;

        let results = self.ingest(&source).await?;
        Ok(LoadSummary {
            discipline: results.discipline.clone(),
            category: results.category.clone(),
            count: results.competitors.len(),
        })
    }

    /// Fetch, parse and apply a source under the ingest lock
    async fn ingest(&self, source: &SourceRef) -> Result<ResultSet> {
        let _guard = self.ingest_lock.lock().await;
        let provider = source.connect(&self.client);

        let content = provider.fetch_content().await?;
        let results = parser::parse_workbook(&content)?;

        // Best effort: a source without metadata still loads fine, the
        // watcher just cannot detect changes for it.
        let stamp = match provider.fetch_metadata().await {
            Ok(stamp) => Some(stamp),
            Err(e) => {
                warn!(source = %provider.describe(), error = %e, "Could not read modification stamp");
                None
            }
        };

        let applied = self.state.load(results);
        {
            let mut slot = self.slot();
            slot.current = Some(source.clone());
            slot.last_modified = stamp;
        }

        info!(
            source = %provider.describe(),
            count = applied.competitors.len(),
            category = ?applied.category,
            "Loaded results"
        );
        self.hub.broadcast(
            Scope::Operator,
            Event::LiveUpdate {
                data: applied.clone(),
            },
        );
        Ok(applied)
    }

    /// One change-detection pass, driven by the watcher
    ///
    /// Returns whether new content was applied. The last-observed stamp
    /// advances as soon as a change is detected, even when the new
    /// content later fails to fetch or parse, so broken uploads are
    /// attempted once per upstream save instead of once per tick.
    pub async fn check_for_update(&self) -> Result<bool> {
        let _guard = self.ingest_lock.lock().await;
        self.note_check();

        let (source, last_modified) = {
            let slot = self.slot();
            match &slot.current {
                Some(source) => (source.clone(), slot.last_modified.clone()),
                None => return Ok(false),
            }
        };

        let provider = source.connect(&self.client);
        let stamp = provider.fetch_metadata().await?;
        if last_modified.as_deref() == Some(stamp.as_str()) {
            return Ok(false);
        }

        info!(
            source = %provider.describe(),
            previous = ?last_modified,
            current = %stamp,
            "Source changed; refreshing"
        );
        self.slot().last_modified = Some(stamp);

        let content = provider.fetch_content().await?;
        let results = match parser::parse_workbook(&content) {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    source = %provider.describe(),
                    error = %e,
                    "Changed content failed to parse; treating it as seen until the next change"
                );
                return Err(e.into());
            }
        };

        let applied = self.state.load(results);
        self.hub.broadcast(
            Scope::Operator,
            Event::LiveUpdate {
                data: applied.clone(),
            },
        );
        info!(count = applied.competitors.len(), "Auto-refresh applied");
        Ok(true)
    }

    /// Copy the live set to the public view, optionally truncated
    pub fn publish(&self, limit: Option<usize>) -> Result<PublicView> {
        if self.state.live().is_empty() {
            return Err(Error::validation("No results to publish"));
        }
        let limit = limit.or(self.default_display_limit);
        let view = self.state.publish(limit);
        self.hub
            .broadcast_both(Event::PublicUpdate { data: view.clone() });
        Ok(view)
    }

    /// Set the live completion flag
    pub fn mark_complete(&self, complete: bool) -> ResultSet {
        let live = self.state.mark_complete(complete);
        self.hub.broadcast(
            Scope::Operator,
            Event::LiveUpdate { data: live.clone() },
        );
        live
    }

    /// Put a message on the public display
    pub fn display_message(&self, message: impl Into<String>) -> PublicView {
        let view = self.state.display_message(message);
        self.hub
            .broadcast_both(Event::PublicUpdate { data: view.clone() });
        view
    }

    /// Switch the public display between results and message
    pub fn switch_display_mode(&self, mode: &str) -> Result<PublicView> {
        let mode = DisplayMode::parse(mode).ok_or_else(|| {
            Error::validation(format!(
                "Invalid display mode {mode:?}. Must be 'results' or 'message'."
            ))
        })?;
        let view = self.state.switch_display_mode(mode);
        self.hub
            .broadcast_both(Event::PublicUpdate { data: view.clone() });
        Ok(view)
    }

    /// Record and push a new background reference
    pub fn set_background(&self, url: impl Into<String>) -> String {
        let url = self.state.set_background(url);
        self.hub
            .broadcast_both(Event::BackgroundUpdate { url: url.clone() });
        url
    }

    /// Update the auto-refresh switch and cadence
    pub fn set_auto_refresh(
        &self,
        enabled: Option<bool>,
        interval_secs: Option<u64>,
    ) -> Result<AutoRefreshSettings> {
        if let Some(interval) = interval_secs {
            if interval < MIN_REFRESH_INTERVAL_SECS {
                return Err(Error::validation(format!(
                    "Refresh interval must be at least {MIN_REFRESH_INTERVAL_SECS} seconds"
                )));
            }
        }

        let mut settings = self
            .auto_refresh
            .lock()
            .expect("auto refresh lock poisoned");
        if let Some(enabled) = enabled {
            settings.enabled = enabled;
        }
        if let Some(interval) = interval_secs {
            settings.interval_secs = interval;
        }
        Ok(*settings)
    }

    pub fn auto_refresh(&self) -> AutoRefreshSettings {
        *self
            .auto_refresh
            .lock()
            .expect("auto refresh lock poisoned")
    }

    /// Whether a source is configured for change detection
    pub fn has_source(&self) -> bool {
        self.slot().current.is_some()
    }

    fn note_check(&self) {
        *self.last_check.lock().expect("last check lock poisoned") = Some(Utc::now());
    }

    /// Auto-refresh status snapshot for the operator console
    pub fn refresh_status(&self) -> RefreshStatus {
        let settings = self.auto_refresh();
        let slot = self.slot();
        RefreshStatus {
            enabled: settings.enabled,
            interval_secs: settings.interval_secs,
            source: slot.current.as_ref().map(|s| s.to_string()),
            last_modified: slot.last_modified.clone(),
            last_check: *self.last_check.lock().expect("last check lock poisoned"),
        }
    }

    /// Snapshot of the live result set
    pub fn live(&self) -> ResultSet {
        self.state.live()
    }

    /// Snapshot of the public view
    pub fn public(&self) -> PublicView {
        self.state.public()
    }
}
