//! podium - Live competition results distribution
//!
//! A server that distributes live skating-competition results from a
//! periodically-updated workbook to an operator console and a public
//! display, over WebSocket push channels.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`parser`] - Results workbook parsing
//! - [`models`] - Core data structures and types
//! - [`state`] - Live and public competition state
//! - [`hub`] - Broadcast hub for the push channels
//! - [`source`] - Result sources (HTTP, local files)
//! - [`engine`] - Action API tying state, hub and sources together
//! - [`watcher`] - Background change detection
//! - [`server`] - HTTP/WebSocket surface
//!
//! # Example
//!
//! ```no_run
//! use podium::config::Config;
//! use podium::server::PodiumServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = PodiumServer::new(config)?;
//!     server.start_with_shutdown(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod hub;
pub mod models;
pub mod parser;
pub mod server;
pub mod source;
pub mod state;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::engine::Engine;
    pub use crate::error::{Error, ParseError, Result, SourceError};
    pub use crate::hub::BroadcastHub;
    pub use crate::models::{Competitor, DisplayMode, Event, PublicView, ResultSet, Scope};
    pub use crate::state::CompetitionState;
}

// Direct re-exports for convenience
pub use models::{Competitor, DisplayMode, Event, PublicView, ResultSet, Scope};
