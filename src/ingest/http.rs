// src/ingest/http.rs
use async_trait::async_trait;
use metrics::histogram;
use reqwest::{header::ACCEPT, Client};
use std::time::{Duration, Instant};

use crate::config::FetchSettings;
use crate::error::FetchError;
use crate::ingest::types::{SourceDescriptor, SourceFeed, SourceFetcher};

const USER_AGENT: &str = concat!("repack-search/", env!("CARGO_PKG_VERSION"));

/// Fetches JSON feeds over HTTP with bounded, exponentially backed-off retries.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    max_retries: u8,
    backoff: Duration,
}

impl HttpFeedFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.backoff_ms),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<SourceFeed, FetchError> {
        let rsp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = rsp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = rsp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Longest single wait between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// `base * 2^(attempt-1)`, saturating at [`MAX_BACKOFF`].
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    base.checked_mul(factor).map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
}

#[async_trait]
impl SourceFetcher for HttpFeedFetcher {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<SourceFeed, FetchError> {
        let t0 = Instant::now();
        let mut attempt: u32 = 0;
        let result = loop {
            attempt += 1;
            match self.fetch_once(&source.url).await {
                Ok(feed) => break Ok(feed),
                Err(e) if e.is_transient() && attempt <= u32::from(self.max_retries) => {
                    let wait = backoff_delay(self.backoff, attempt);
                    tracing::debug!(
                        source = %source.name,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "retrying feed fetch"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => break Err(e),
            }
        };
        histogram!("source_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        result
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
