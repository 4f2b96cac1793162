// src/search.rs
//! Query entry point: consolidate across the configured feeds, then finalize.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::consolidate::{Consolidator, FetchMode};
use crate::finalize::{finalize, GameData};
use crate::image::ImageResolver;
use crate::ingest::types::{SourceDescriptor, SourceFetcher};

/// Search `sources` for `query` and return the finalized game list.
pub async fn search_games(
    query: &str,
    sources: &[SourceDescriptor],
    fetcher: &dyn SourceFetcher,
    images: &dyn ImageResolver,
    catalog: &Catalog,
    mode: FetchMode,
) -> Vec<GameData> {
    let map = Consolidator::new(&catalog.aliases, fetcher, images)
        .run(query, sources, mode)
        .await;
    finalize(map)
}

/// Long-lived owner of the configuration and collaborators a query needs.
/// Each call to [`SearchService::search`] builds and drops its own consolidation map.
#[derive(Clone)]
pub struct SearchService {
    sources: Arc<Vec<SourceDescriptor>>,
    catalog: Arc<Catalog>,
    fetcher: Arc<dyn SourceFetcher>,
    images: Arc<dyn ImageResolver>,
    mode: FetchMode,
}

impl SearchService {
    pub fn new(
        sources: Vec<SourceDescriptor>,
        catalog: Arc<Catalog>,
        fetcher: Arc<dyn SourceFetcher>,
        images: Arc<dyn ImageResolver>,
    ) -> Self {
        Self {
            sources: Arc::new(sources),
            catalog,
            fetcher,
            images,
            mode: FetchMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn search(&self, query: &str) -> Vec<GameData> {
        search_games(
            query,
            &self.sources,
            self.fetcher.as_ref(),
            self.images.as_ref(),
            &self.catalog,
            self.mode,
        )
        .await
    }
}
