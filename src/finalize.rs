// src/finalize.rs
//! Turn the consolidation map into the response shape, plus the optional
//! presentation re-sort (by newest upload or largest size).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::consolidate::{GameMap, SourceReference};
use crate::dates::parse_upload_date;
use crate::size::parse_size;

/// One game as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub sources: Vec<SourceReference>,
}

/// Newest first. Unparsable dates sort last; ties keep insertion order.
fn by_date_desc(a: &SourceReference, b: &SourceReference) -> Ordering {
    parse_upload_date(&b.upload_date).cmp(&parse_upload_date(&a.upload_date))
}

fn by_size_desc(a: &SourceReference, b: &SourceReference) -> Ordering {
    parse_size(&b.file_size).total_cmp(&parse_size(&a.file_size))
}

/// Sort each game's sources by recency and project to `GameData`.
/// Games keep first-seen order.
pub fn finalize(map: GameMap) -> Vec<GameData> {
    map.into_games()
        .into_iter()
        .map(|game| {
            let mut sources = game.sources;
            // `sort_by` is stable.
            sources.sort_by(by_date_desc);
            GameData {
                name: game.canonical_name,
                image: game.image,
                sources,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Date,
    Size,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "size" => Ok(Self::Size),
            other => Err(format!("unknown sort key '{other}' (expected 'date' or 'size')")),
        }
    }
}

/// Presentation-only ordering over finalized output.
///
/// Sources inside each game are ordered by the key, and games by the best value
/// any of their sources has for it. Both sorts are stable.
pub fn sort_results(mut games: Vec<GameData>, key: SortKey) -> Vec<GameData> {
    let cmp: fn(&SourceReference, &SourceReference) -> Ordering = match key {
        SortKey::Date => by_date_desc,
        SortKey::Size => by_size_desc,
    };
    for g in &mut games {
        g.sources.sort_by(cmp);
    }
    match key {
        SortKey::Date => {
            games.sort_by_cached_key(|g| {
                std::cmp::Reverse(
                    g.sources
                        .iter()
                        .filter_map(|s| parse_upload_date(&s.upload_date))
                        .max(),
                )
            });
        }
        SortKey::Size => {
            let best = |g: &GameData| {
                g.sources
                    .iter()
                    .map(|s| parse_size(&s.file_size))
                    .fold(0.0f64, f64::max)
            };
            games.sort_by(|a, b| best(b).total_cmp(&best(a)));
        }
    }
    games
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::{ConsolidatedGame, GameMap};

    fn src(name: &str, size: &str, date: &str) -> SourceReference {
        SourceReference {
            name: name.into(),
            url: format!("magnet:{name}"),
            file_size: size.into(),
            upload_date: date.into(),
        }
    }

    fn game(name: &str, sources: Vec<SourceReference>) -> GameData {
        GameData {
            name: name.into(),
            image: None,
            sources,
        }
    }

    #[test]
    fn sources_newest_first_with_stable_ties() {
        let mut g = ConsolidatedGame::new("Hades".into(), "hades".into(), None);
        g.add_source(src("old", "1 GB", "2021-01-01"));
        g.add_source(src("tie-a", "1 GB", "2023-01-01"));
        g.add_source(src("junk", "1 GB", "soon"));
        g.add_source(src("tie-b", "2 GB", "2023-01-01T00:00:00Z"));
        g.add_source(src("new", "1 GB", "2024-01-01"));

        let out = finalize(GameMap::from_games(vec![g]));
        let order: Vec<_> = out[0].sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["new", "tie-a", "tie-b", "old", "junk"]);
    }

    #[test]
    fn sort_by_size_orders_games_by_largest_source() {
        let games = vec![
            game("Small", vec![src("a", "900 MB", "2024-01-01")]),
            game("Big", vec![src("b", "1 GB", "2020-01-01"), src("c", "40 GB", "2019-01-01")]),
        ];
        let out = sort_results(games, SortKey::Size);
        assert_eq!(out[0].name, "Big");
        assert_eq!(out[0].sources[0].name, "c");
    }

    #[test]
    fn sort_by_date_orders_games_by_newest_source() {
        let games = vec![
            game("Old", vec![src("a", "1 GB", "2019-01-01")]),
            game("Undated", vec![src("x", "1 GB", "")]),
            game("New", vec![src("b", "1 GB", "2018-01-01"), src("c", "1 GB", "2024-06-01")]),
        ];
        let out = sort_results(games, SortKey::Date);
        let names: Vec<_> = out.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old", "Undated"]);
    }

    #[test]
    fn sort_key_parses() {
        assert_eq!("Date".parse::<SortKey>(), Ok(SortKey::Date));
        assert_eq!(" size ".parse::<SortKey>(), Ok(SortKey::Size));
        assert!("name".parse::<SortKey>().is_err());
    }
}
