// Core data structures for the podium results server

use serde::{Deserialize, Serialize};

/// A single scored competitor row from the results workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Competitor {
    pub rank: u32,
    pub name: String,
    pub team: String,
    pub country: String,
    pub penalty: i32,
    pub judge1: i32,
    pub judge2: i32,
    pub judge3: i32,
    pub remark: String,
    /// Most recent competitor with complete judge scores, used to
    /// highlight progress through the starting order.
    pub last_performed: bool,
}

/// The full, operator-facing result set for one discipline/category
///
/// Replaced wholesale on every load or refresh; never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResultSet {
    pub discipline: Option<String>,
    pub category: Option<String>,
    pub competitors: Vec<Competitor>,
    pub category_complete: bool,
}

impl ResultSet {
    /// Build a result set fresh from the parser, completion flag cleared
    pub fn new(
        discipline: Option<String>,
        category: Option<String>,
        competitors: Vec<Competitor>,
    ) -> Self {
        Self {
            discipline,
            category,
            competitors,
            category_complete: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    /// Name of the flagged last performer, if any
    pub fn last_performed(&self) -> Option<&str> {
        self.competitors
            .iter()
            .find(|c| c.last_performed)
            .map(|c| c.name.as_str())
    }
}

/// What the public display is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Results,
    Message,
}

impl DisplayMode {
    /// Parse from the wire representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "results" => Some(Self::Results),
            "message" => Some(Self::Message),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Results => "results",
            Self::Message => "message",
        }
    }
}

impl Default for DisplayMode {
    fn default() -> Self {
        Self::Results
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The audience-facing view: a snapshot taken at publish time, possibly
/// truncated, possibly overridden by a free-text message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PublicView {
    pub discipline: Option<String>,
    pub category: Option<String>,
    pub competitors: Vec<Competitor>,
    pub category_complete: bool,
    pub message: String,
    pub display_mode: DisplayMode,
}

impl PublicView {
    /// A view with nothing to show: no competitors and no message
    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty() && self.message.is_empty()
    }
}

/// Which subscriber group an event or connection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Operator,
    Public,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Public => "public",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Push event fanned out to channel subscribers
///
/// Serializes to the wire shape `{"type": ..., "data"|"url": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    LiveUpdate { data: ResultSet },
    PublicUpdate { data: PublicView },
    BackgroundUpdate { url: String },
}

impl Event {
    /// Wire-level event type, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LiveUpdate { .. } => "live_update",
            Self::PublicUpdate { .. } => "public_update",
            Self::BackgroundUpdate { .. } => "background_update",
        }
    }
}
