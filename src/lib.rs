// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod alias;
pub mod api;
pub mod catalog;
pub mod config;
pub mod consolidate;
pub mod dates;
pub mod error;
pub mod finalize;
pub mod image;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod search;
pub mod size;

// ---- Re-exports for stable public API ----
pub use crate::alias::{resolve, AliasEntry, AliasTable};
pub use crate::api::router;
pub use crate::consolidate::{consolidate, ConsolidatedGame, FetchMode, GameMap, SourceReference};
pub use crate::finalize::{finalize, sort_results, GameData, SortKey};
pub use crate::normalize::normalize;
pub use crate::search::{search_games, SearchService};
pub use crate::size::parse_size;
