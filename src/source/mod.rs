//! Result sources: where workbook bytes come from
//!
//! The change watcher and the manual load/refresh actions talk to a
//! [`ResultSource`]: something that can report a modification stamp and
//! hand over the current file content. Two providers are built in: an
//! HTTP(S) URL and a local file path. Credential-bearing providers
//! (corporate drives and the like) live behind the same trait, outside
//! this crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{CACHE_CONTROL, ETAG, EXPIRES, LAST_MODIFIED, PRAGMA};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::SourceError;

/// A provider of workbook bytes with change-detection metadata
#[async_trait]
pub trait ResultSource: Send + Sync {
    /// Human-readable description for logs and acknowledgements
    fn describe(&self) -> String;

    /// Opaque modification stamp; two fetches of unchanged content must
    /// return equal stamps
    async fn fetch_metadata(&self) -> Result<String, SourceError>;

    /// The current file content
    async fn fetch_content(&self) -> Result<Bytes, SourceError>;
}

/// A parsed reference to a result source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRef {
    Url(Url),
    Path(PathBuf),
}

impl SourceRef {
    /// Parse a source string: an http(s) URL or a local file path
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SourceError::InvalidSource("empty source".to_string()));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed)
                .map_err(|e| SourceError::InvalidSource(format!("{trimmed}: {e}")))?;
            Ok(Self::Url(url))
        } else if trimmed.contains("://") {
            Err(SourceError::InvalidSource(format!(
                "unsupported scheme in {trimmed}"
            )))
        } else {
            Ok(Self::Path(PathBuf::from(trimmed)))
        }
    }

    /// Materialize the provider for this reference
    pub fn connect(&self, client: &Client) -> Box<dyn ResultSource> {
        match self {
            Self::Url(url) => Box::new(HttpSource::new(client.clone(), url.clone())),
            Self::Path(path) => Box::new(PathSource::new(path)),
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Build the shared HTTP client used for all source fetches
pub fn build_client(timeout: Duration) -> Result<Client, SourceError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Workbook served over HTTP(S)
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ResultSource for HttpSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch_metadata(&self) -> Result<String, SourceError> {
        let response = self.client.head(self.url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let header = |name| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        header(LAST_MODIFIED)
            .or_else(|| header(ETAG))
            .ok_or(SourceError::MetadataUnavailable)
    }

    async fn fetch_content(&self) -> Result<Bytes, SourceError> {
        // Intermediaries love caching spreadsheets; insist on the
        // current revision.
        let response = self
            .client
            .get(self.url.clone())
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let content = response.bytes().await?;
        debug!(url = %self.url, bytes = content.len(), "Fetched workbook content");
        if content.is_empty() {
            return Err(SourceError::EmptyContent);
        }
        Ok(content)
    }
}

/// Workbook read from the local filesystem
pub struct PathSource {
    path: PathBuf,
}

impl PathSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ResultSource for PathSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_metadata(&self) -> Result<String, SourceError> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        let modified = metadata.modified()?;
        let stamp: DateTime<Utc> = modified.into();
        Ok(stamp.to_rfc3339())
    }

    async fn fetch_content(&self) -> Result<Bytes, SourceError> {
        let content = tokio::fs::read(&self.path).await?;
        if content.is_empty() {
            return Err(SourceError::EmptyContent);
        }
        Ok(Bytes::from(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_ref_parses_urls() {
        let source = SourceRef::parse("https://results.example.com/finals.xlsx").unwrap();
        assert!(matches!(source, SourceRef::Url(_)));
        assert_eq!(
            source.to_string(),
            "https://results.example.com/finals.xlsx"
        );
    }

    #[test]
    fn test_source_ref_parses_paths() {
        let source = SourceRef::parse("data/finals.xlsx").unwrap();
        assert_eq!(source, SourceRef::Path(PathBuf::from("data/finals.xlsx")));
    }

    #[test]
    fn test_source_ref_rejects_empty() {
        assert!(SourceRef::parse("   ").is_err());
    }

    #[test]
    fn test_source_ref_rejects_malformed_url() {
        assert!(SourceRef::parse("http://[bad").is_err());
    }

    #[test]
    fn test_source_ref_rejects_unsupported_scheme() {
        assert!(SourceRef::parse("ftp://example.com/finals.xlsx").is_err());
    }
}
