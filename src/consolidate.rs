//! # Consolidation Engine
//! Merges listings from every configured feed into one record per canonical game.
//!
//! Per matching entry: `normalize` → alias `resolve` → lower-cased key. The first
//! entry for a key creates the record and triggers the single image lookup for it;
//! every entry then contributes a source reference unless an identical
//! `(name, fileSize, uploadDate, url)` reference is already attached. Aggregates
//! (largest size, most recent upload) move only when a reference is appended.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::alias::AliasTable;
use crate::dates::{self, EPOCH_FLOOR};
use crate::image::ImageResolver;
use crate::ingest::types::{RawDownloadEntry, SourceDescriptor, SourceFeed, SourceFetcher};
use crate::ingest::{self, ensure_metrics_described};
use crate::normalize::normalize;
use crate::size::parse_size;

/// How feeds are pulled. Merging is always single-writer in configured order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    #[default]
    Sequential,
    Concurrent,
}

/// A download link attached to a consolidated game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    pub name: String,
    pub url: String,
    pub file_size: String,
    pub upload_date: String,
}

impl SourceReference {
    pub fn from_entry(source: &SourceDescriptor, entry: &RawDownloadEntry) -> Self {
        Self {
            name: source.name.clone(),
            url: entry.primary_uri().to_string(),
            file_size: entry.file_size.clone(),
            upload_date: entry.upload_date.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedGame {
    pub canonical_name: String,
    pub normalized_key: String,
    pub image: Option<String>,
    pub sources: Vec<SourceReference>,
    pub largest_size_mb: f64,
    pub most_recent_date: String,
}

impl ConsolidatedGame {
    pub fn new(canonical_name: String, normalized_key: String, image: Option<String>) -> Self {
        Self {
            canonical_name,
            normalized_key,
            image,
            sources: Vec::new(),
            largest_size_mb: 0.0,
            most_recent_date: EPOCH_FLOOR.to_string(),
        }
    }

    /// Append unless an equal reference exists. Returns whether it was appended.
    pub fn add_source(&mut self, reference: SourceReference) -> bool {
        if self.sources.contains(&reference) {
            return false;
        }
        let size = parse_size(&reference.file_size);
        if size > self.largest_size_mb {
            self.largest_size_mb = size;
        }
        if dates::is_later(&reference.upload_date, &self.most_recent_date) {
            self.most_recent_date = reference.upload_date.clone();
        }
        self.sources.push(reference);
        true
    }
}

/// Key → game, iterated in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GameMap {
    games: Vec<ConsolidatedGame>,
    index: HashMap<String, usize>,
}

impl GameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records that already carry distinct keys; later duplicates are dropped.
    pub fn from_games(games: Vec<ConsolidatedGame>) -> Self {
        let mut map = Self::new();
        for g in games {
            if !map.contains_key(&g.normalized_key) {
                map.insert(g);
            }
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&ConsolidatedGame> {
        self.index.get(key).map(|&i| &self.games[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConsolidatedGame> {
        self.games.iter()
    }

    pub fn into_games(self) -> Vec<ConsolidatedGame> {
        self.games
    }

    fn insert(&mut self, game: ConsolidatedGame) -> usize {
        let i = self.games.len();
        self.index.insert(game.normalized_key.clone(), i);
        self.games.push(game);
        i
    }
}

/// Display title and map key for a raw listing title.
///
/// Titles that normalize to nothing (pure release tags) fall back to their
/// whitespace-collapsed raw form so they still land somewhere.
pub fn canonical_title(raw_title: &str, aliases: &AliasTable) -> (String, String) {
    let mut key = normalize(raw_title);
    if key.is_empty() {
        key = raw_title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
    }
    let clean = aliases.resolve(&key);
    let map_key = clean.to_lowercase();
    (clean, map_key)
}

pub struct Consolidator<'a> {
    aliases: &'a AliasTable,
    fetcher: &'a dyn SourceFetcher,
    images: &'a dyn ImageResolver,
}

impl<'a> Consolidator<'a> {
    pub fn new(
        aliases: &'a AliasTable,
        fetcher: &'a dyn SourceFetcher,
        images: &'a dyn ImageResolver,
    ) -> Self {
        Self {
            aliases,
            fetcher,
            images,
        }
    }

    pub async fn run(&self, query: &str, sources: &[SourceDescriptor], mode: FetchMode) -> GameMap {
        ensure_metrics_described();
        counter!("search_queries_total").increment(1);

        let mut map = GameMap::new();
        let mut failed = 0usize;

        match mode {
            FetchMode::Sequential => {
                for source in sources {
                    match ingest::fetch_source(self.fetcher, source).await {
                        Some(feed) => self.merge_feed(&mut map, source, &feed, query).await,
                        None => failed += 1,
                    }
                }
            }
            FetchMode::Concurrent => {
                let feeds = ingest::fetch_concurrently(self.fetcher, sources).await;
                for (source, feed) in sources.iter().zip(feeds) {
                    match feed {
                        Some(feed) => self.merge_feed(&mut map, source, &feed, query).await,
                        None => failed += 1,
                    }
                }
            }
        }

        info!(
            query,
            games = map.len(),
            sources_ok = sources.len() - failed,
            sources_failed = failed,
            ?mode,
            "consolidation finished"
        );
        map
    }

    async fn merge_feed(
        &self,
        map: &mut GameMap,
        source: &SourceDescriptor,
        feed: &SourceFeed,
        query: &str,
    ) {
        for entry in ingest::matching_entries(feed, query) {
            self.merge_entry(map, source, entry).await;
        }
    }

    async fn merge_entry(
        &self,
        map: &mut GameMap,
        source: &SourceDescriptor,
        entry: &RawDownloadEntry,
    ) {
        let (clean_title, key) = canonical_title(&entry.title, self.aliases);
        if key.is_empty() {
            debug!(source = %source.name, "entry without a usable title, skipped");
            return;
        }

        // Creating the record and resolving its image happen before the map is
        // touched again, so each key is looked up at most once.
        let existing = map.index.get(&key).copied();
        let idx = match existing {
            Some(i) => i,
            None => {
                let image = self.lookup_image(&clean_title).await;
                map.insert(ConsolidatedGame::new(clean_title, key, image))
            }
        };

        let game = &mut map.games[idx];
        if !game.add_source(SourceReference::from_entry(source, entry)) {
            debug!(source = %source.name, key = %game.normalized_key, "duplicate source reference");
        }
    }

    async fn lookup_image(&self, title: &str) -> Option<String> {
        counter!("image_lookups_total").increment(1);
        match self.images.resolve(title).await {
            Ok(Some(url)) => Some(url),
            Ok(None) => {
                counter!("image_unresolved_total").increment(1);
                debug!(title, resolver = self.images.name(), "no image match");
                None
            }
            Err(e) => {
                counter!("image_unresolved_total").increment(1);
                debug!(title, resolver = self.images.name(), error = %e, "image lookup failed");
                None
            }
        }
    }
}

/// Sequential consolidation of `sources` for `query`.
pub async fn consolidate(
    query: &str,
    sources: &[SourceDescriptor],
    fetcher: &dyn SourceFetcher,
    images: &dyn ImageResolver,
    aliases: &AliasTable,
) -> GameMap {
    Consolidator::new(aliases, fetcher, images)
        .run(query, sources, FetchMode::Sequential)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::FetchError;
    use crate::image::NoImages;
    use crate::ingest::fixture::StaticFetcher;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingImages {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingImages {
        fn new(fail: bool) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl ImageResolver for RecordingImages {
        async fn resolve(&self, title: &str) -> Result<Option<String>, FetchError> {
            self.seen.lock().unwrap().push(title.to_string());
            if self.fail {
                return Err(FetchError::other("image service down"));
            }
            Ok(Some(format!("img://{title}")))
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn dl(title: &str, uri: &str, date: &str, size: &str) -> RawDownloadEntry {
        RawDownloadEntry {
            title: title.into(),
            uris: if uri.is_empty() { vec![] } else { vec![uri.into()] },
            upload_date: date.into(),
            file_size: size.into(),
        }
    }

    fn feed(name: &str, downloads: Vec<RawDownloadEntry>) -> SourceFeed {
        SourceFeed {
            name: name.into(),
            downloads,
        }
    }

    #[test]
    fn add_source_dedups_and_tracks_aggregates() {
        let mut g = ConsolidatedGame::new("Hades".into(), "hades".into(), None);
        let r = |url: &str, size: &str, date: &str| SourceReference {
            name: "A".into(),
            url: url.into(),
            file_size: size.into(),
            upload_date: date.into(),
        };
        assert!(g.add_source(r("u1", "5 GB", "2023-01-01")));
        assert!(!g.add_source(r("u1", "5 GB", "2023-01-01")));
        assert!(g.add_source(r("u2", "700 MB", "2024-03-01")));
        assert!(g.add_source(r("u3", "N/A", "not a date")));
        assert_eq!(g.sources.len(), 3);
        assert_eq!(g.largest_size_mb, 5120.0);
        assert_eq!(g.most_recent_date, "2024-03-01");
    }

    #[test]
    fn canonical_title_falls_back_for_tag_only_titles() {
        let aliases = AliasTable::default();
        assert_eq!(
            canonical_title("[FitGirl  Repack]", &aliases),
            ("[fitgirl Repack]".to_string(), "[fitgirl repack]".to_string())
        );
    }

    #[test]
    fn build_tags_do_not_split_keys_and_aliases_restore_sequels() {
        let seed = Catalog::default_seed();
        assert_eq!(
            canonical_title("Stray v 1 0 2 1474", &seed.aliases),
            canonical_title("Stray", &seed.aliases)
        );
        assert_eq!(
            canonical_title("Resident Evil 4 Remake v1.0 1535", &seed.aliases),
            ("Resident Evil 4".to_string(), "resident evil 4".to_string())
        );
        assert_eq!(
            canonical_title("Resident Evil 8 Village", &seed.aliases).0,
            "Resident Evil Village"
        );
    }

    #[tokio::test]
    async fn one_image_lookup_per_key_and_missing_uri_is_empty() {
        let fetcher = StaticFetcher::new()
            .with_feed(
                "mem://a",
                feed(
                    "A",
                    vec![
                        dl("Hades v1.38 [FitGirl Repack]", "", "2023-05-01", "5 GB"),
                        dl("Hades Repack", "magnet:b", "2023-06-01", "6 GB"),
                    ],
                ),
            )
            .with_feed("mem://b", feed("B", vec![dl("HADES", "magnet:c", "2022-01-01", "4 GB")]));
        let sources = vec![
            SourceDescriptor::new("A", "mem://a"),
            SourceDescriptor::new("B", "mem://b"),
        ];
        let images = RecordingImages::new(false);
        let aliases = AliasTable::default();

        let map = consolidate("hades", &sources, &fetcher, &images, &aliases).await;

        assert_eq!(map.len(), 1);
        let g = map.get("hades").unwrap();
        assert_eq!(g.canonical_name, "Hades");
        assert_eq!(g.image.as_deref(), Some("img://Hades"));
        assert_eq!(g.sources.len(), 3);
        assert_eq!(g.sources[0].url, "");
        assert_eq!(g.largest_size_mb, 6144.0);
        assert_eq!(g.most_recent_date, "2023-06-01");
        assert_eq!(*images.seen.lock().unwrap(), vec!["Hades".to_string()]);
    }

    #[tokio::test]
    async fn failed_image_lookup_still_creates_game() {
        let fetcher = StaticFetcher::new()
            .with_feed("mem://a", feed("A", vec![dl("Stray", "u", "2023-01-01", "7 GB")]));
        let sources = vec![SourceDescriptor::new("A", "mem://a")];
        let images = RecordingImages::new(true);
        let map = consolidate("stray", &sources, &fetcher, &images, &AliasTable::default()).await;
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("stray").unwrap().image, None);
    }

    #[tokio::test]
    async fn concurrent_mode_matches_sequential() {
        let fetcher = StaticFetcher::new()
            .with_feed(
                "mem://a",
                feed(
                    "A",
                    vec![
                        dl("Resident Evil 4 Gold Edition", "a1", "2023-03-24", "60 GB"),
                        dl("Resident Evil Village", "a2", "2021-05-07", "30 GB"),
                    ],
                ),
            )
            .with_failure("mem://b", "offline")
            .with_feed(
                "mem://c",
                feed("C", vec![dl("Resident Evil 8 Village v1.2", "c1", "2022-01-01", "28 GB")]),
            );
        let sources = vec![
            SourceDescriptor::new("A", "mem://a"),
            SourceDescriptor::new("B", "mem://b"),
            SourceDescriptor::new("C", "mem://c"),
        ];
        let catalog = Catalog::default_seed();
        let c = Consolidator::new(&catalog.aliases, &fetcher, &NoImages);

        let seq = c.run("resident evil", &sources, FetchMode::Sequential).await;
        let par = c.run("resident evil", &sources, FetchMode::Concurrent).await;

        let names = |m: &GameMap| m.iter().map(|g| g.canonical_name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&seq), vec!["Resident Evil 4", "Resident Evil Village"]);
        assert_eq!(names(&seq), names(&par));
        assert_eq!(
            seq.get("resident evil village").unwrap().sources,
            par.get("resident evil village").unwrap().sources
        );
        assert_eq!(seq.get("resident evil village").unwrap().sources.len(), 2);
    }
}
