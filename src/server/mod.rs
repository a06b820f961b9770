//! HTTP/WebSocket server assembly
//!
//! Builds the router (REST API + push channels), wires the CORS and
//! request-tracing layers, spawns the change watcher, and runs the server
//! until shutdown.

pub mod api;
pub mod ws;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::engine::Engine;
use crate::watcher::{UpdateWatcher, WatcherConfig};

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The competition engine
    pub engine: Arc<Engine>,

    /// Server start time
    pub start_time: Instant,
}

// ============================================================================
// Podium Server
// ============================================================================

/// Main results server
pub struct PodiumServer {
    config: Config,
    state: AppState,
}

impl PodiumServer {
    /// Create a new server from configuration
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let engine =
            Engine::from_config(&config).map_err(|e| ServerError::InitError(e.to_string()))?;

        let state = AppState {
            engine,
            start_time: Instant::now(),
        };

        Ok(Self { config, state })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = api::create_router(self.state.clone())
            .merge(ws::create_router(self.state.clone()));

        if self.config.server.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.server.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.server.bind_address;

        tracing::info!("Starting podium server on {}", addr);

        self.start_background_tasks();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Podium server shutdown complete");
        Ok(())
    }

    /// Spawn the change watcher
    fn start_background_tasks(&self) {
        UpdateWatcher::spawn(Arc::clone(&self.state.engine), WatcherConfig::default());
        tracing::info!("Change watcher started");
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Initialization error
    InitError(String),

    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::InitError(msg) => write!(f, "Initialization error: {}", msg),
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

// ============================================================================
// Tests
// ============================================================================
