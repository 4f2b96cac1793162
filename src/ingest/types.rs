// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A configured download-index feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String, // e.g. "FitGirl", "DODI"
    pub url: String,  // JSON feed endpoint
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One listing as published by a feed. Missing fields decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDownloadEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uris: Vec<String>, // first one is the canonical link
    #[serde(default)]
    pub upload_date: String,
    #[serde(default)]
    pub file_size: String,
}

impl RawDownloadEntry {
    pub fn primary_uri(&self) -> &str {
        self.uris.first().map(String::as_str).unwrap_or("")
    }
}

/// `{ name, downloads: [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFeed {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub downloads: Vec<RawDownloadEntry>,
}

#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<SourceFeed, FetchError>;
    fn name(&self) -> &'static str;
}
