// src/ingest/mod.rs
pub mod fixture;
pub mod http;
pub mod types;

use crate::ingest::types::{RawDownloadEntry, SourceDescriptor, SourceFeed, SourceFetcher};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("search_queries_total", "Queries run through consolidation.");
        describe_counter!(
            "source_fetch_errors_total",
            "Feed fetch/decode failures, by source."
        );
        describe_counter!("image_lookups_total", "Cover image lookups performed.");
        describe_counter!(
            "image_unresolved_total",
            "Image lookups that failed or found nothing."
        );
        describe_histogram!("source_fetch_ms", "Feed fetch time in milliseconds.");
    });
}

/// Fetch one feed. A failure is logged and counted, and the source contributes nothing.
pub async fn fetch_source(
    fetcher: &dyn SourceFetcher,
    source: &SourceDescriptor,
) -> Option<SourceFeed> {
    match fetcher.fetch(source).await {
        Ok(feed) => Some(feed),
        Err(e) => {
            tracing::warn!(error = %e, source = %source.name, fetcher = fetcher.name(), "source unavailable, skipping");
            counter!("source_fetch_errors_total", "source" => source.name.clone()).increment(1);
            None
        }
    }
}

/// Fetch every feed at once; results come back in `sources` order.
pub async fn fetch_concurrently(
    fetcher: &dyn SourceFetcher,
    sources: &[SourceDescriptor],
) -> Vec<Option<SourceFeed>> {
    futures::future::join_all(sources.iter().map(|s| fetch_source(fetcher, s))).await
}

/// Entries whose title contains `query`, case-insensitively (plain substring, not tokens).
pub fn matching_entries<'a>(
    feed: &'a SourceFeed,
    query: &str,
) -> impl Iterator<Item = &'a RawDownloadEntry> + 'a {
    let needle = query.to_lowercase();
    feed.downloads
        .iter()
        .filter(move |d| d.title.to_lowercase().contains(&needle))
}
