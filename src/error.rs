//! Error types for the podium results server
//!
//! Domain-specific errors ([`SourceError`], [`ParseError`]) are wrapped by
//! the unified [`Error`] enum used across module boundaries. The scheduler
//! consults [`Error::is_retryable`] when deciding whether a failed tick
//! should back off or is a permanent misconfiguration.

use std::io;
use thiserror::Error;

/// Errors raised while fetching from a remote or local result source
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error: {0}")]
    Status(u16),

    /// Fetched body was empty
    #[error("Source returned an empty file")]
    EmptyContent,

    /// Source exposes no usable modification metadata
    #[error("Source provides no modification metadata")]
    MetadataUnavailable,

    /// Local file error
    #[error("File error: {0}")]
    Io(#[from] io::Error),

    /// Source reference could not be understood
    #[error("Invalid source: {0}")]
    InvalidSource(String),
}

impl SourceError {
    /// Transient failures are worth retrying on a later tick
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Status(_) | Self::EmptyContent | Self::Io(_) => true,
            Self::MetadataUnavailable | Self::InvalidSource(_) => false,
        }
    }
}

/// Errors raised while extracting results from workbook bytes
#[derive(Error, Debug)]
pub enum ParseError {
    /// The workbook could not be decoded at all
    #[error("Workbook could not be read: {0}")]
    InvalidWorkbook(String),

    /// A required sheet is absent
    #[error("Required sheet {0:?} is missing")]
    MissingSheet(&'static str),

    /// The results table lacks required columns
    #[error("Required columns missing from results table: {0}")]
    MissingColumns(String),
}

/// Unified error type for the podium crate
#[derive(Error, Debug)]
pub enum Error {
    /// Remote or local source failure
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Workbook extraction failure
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Invalid action parameters
    #[error("{0}")]
    Validation(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether a later attempt against the same source may succeed
    ///
    /// Parse and validation failures are deterministic for a given input;
    /// transport-level failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_transient(),
            Self::Io(_) => true,
            Self::Parse(_) | Self::Validation(_) | Self::Config(_) | Self::Json(_) => false,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
