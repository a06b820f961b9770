//! Configuration management for the podium server
//!
//! Configuration is read from `PODIUM_*` environment variables with
//! sensible defaults, then validated before the server starts.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::MIN_REFRESH_INTERVAL_SECS;
use crate::source::SourceRef;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Result source configuration
    pub source: SourceConfig,

    /// Auto-refresh defaults
    pub refresh: RefreshConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to
    pub bind_address: SocketAddr,

    /// Default truncation applied when publishing without a limit
    pub public_display_limit: Option<usize>,

    /// Allow cross-origin requests (operator and public frontends are
    /// usually served from elsewhere)
    pub enable_cors: bool,

    /// Emit a trace span per request
    pub enable_request_logging: bool,
}

/// Result source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source used by `load` when none is given: a URL or a local path
    pub default_source: Option<String>,

    /// Fetch timeout in seconds
    pub request_timeout_secs: u64,
}

/// Auto-refresh defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Start with change detection enabled
    pub auto_refresh_enabled: bool,

    /// Seconds between source checks
    pub interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8000".parse().expect("static address"),
                public_display_limit: None,
                enable_cors: true,
                enable_request_logging: true,
            },
            source: SourceConfig {
                default_source: None,
                request_timeout_secs: 30,
            },
            refresh: RefreshConfig {
                auto_refresh_enabled: true,
                interval_secs: MIN_REFRESH_INTERVAL_SECS,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_address = match std::env::var("PODIUM_BIND_ADDRESS") {
            Ok(raw) => raw
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid PODIUM_BIND_ADDRESS: {raw}"))?,
            Err(_) => defaults.server.bind_address,
        };

        let public_display_limit = std::env::var("PODIUM_DISPLAY_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|limit| *limit > 0);

        let enable_cors = env_flag("PODIUM_ENABLE_CORS", defaults.server.enable_cors);
        let enable_request_logging =
            env_flag("PODIUM_REQUEST_LOGGING", defaults.server.enable_request_logging);

        let default_source = std::env::var("PODIUM_DEFAULT_SOURCE")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let request_timeout_secs = std::env::var("PODIUM_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.source.request_timeout_secs);

        let auto_refresh_enabled =
            env_flag("PODIUM_AUTO_REFRESH", defaults.refresh.auto_refresh_enabled);

        let interval_secs = std::env::var("PODIUM_REFRESH_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.refresh.interval_secs);

        let level = std::env::var("PODIUM_LOG_LEVEL").unwrap_or(defaults.logging.level);
        let format = std::env::var("PODIUM_LOG_FORMAT").unwrap_or(defaults.logging.format);

        let config = Self {
            server: ServerConfig {
                bind_address,
                public_display_limit,
                enable_cors,
                enable_request_logging,
            },
            source: SourceConfig {
                default_source,
                request_timeout_secs,
            },
            refresh: RefreshConfig {
                auto_refresh_enabled,
                interval_secs,
            },
            logging: LoggingConfig { level, format },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.refresh.interval_secs < MIN_REFRESH_INTERVAL_SECS {
            anyhow::bail!(
                "refresh interval must be at least {MIN_REFRESH_INTERVAL_SECS} seconds, got {}",
                self.refresh.interval_secs
            );
        }
        if self.source.request_timeout_secs == 0 {
            anyhow::bail!("request timeout must be positive");
        }
        if let Some(raw) = &self.source.default_source {
            SourceRef::parse(raw)
                .with_context(|| format!("invalid default source: {raw}"))?;
        }
        Ok(())
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh.interval_secs, MIN_REFRESH_INTERVAL_SECS);
        assert!(config.refresh.auto_refresh_enabled);
    }

    #[test]
    fn test_interval_floor_enforced() {
        let mut config = Config::default();
        config.refresh.interval_secs = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_source_must_parse() {
        let mut config = Config::default();
        config.source.default_source = Some("http://[bad".to_string());
        assert!(config.validate().is_err());

        config.source.default_source = Some("https://example.com/finals.xlsx".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.source.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
