// src/ingest/fixture.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::FetchError;
use crate::ingest::types::{SourceDescriptor, SourceFeed, SourceFetcher};

enum Canned {
    Feed(SourceFeed),
    Fail(String),
}

/// In-memory feeds keyed by source URL. Used by tests and offline runs.
#[derive(Default)]
pub struct StaticFetcher {
    feeds: HashMap<String, Canned>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: impl Into<String>, feed: SourceFeed) -> Self {
        self.feeds.insert(url.into(), Canned::Feed(feed));
        self
    }

    /// Parse a JSON body the same way the HTTP fetcher would.
    pub fn with_json(self, url: impl Into<String>, json: &str) -> Result<Self, FetchError> {
        let feed: SourceFeed = serde_json::from_str(json)?;
        Ok(self.with_feed(url, feed))
    }

    pub fn with_failure(mut self, url: impl Into<String>, msg: impl Into<String>) -> Self {
        self.feeds.insert(url.into(), Canned::Fail(msg.into()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<SourceFeed, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.feeds.get(&source.url) {
            Some(Canned::Feed(feed)) => Ok(feed.clone()),
            Some(Canned::Fail(msg)) => Err(FetchError::other(msg.clone())),
            None => Err(FetchError::Missing(source.name.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
