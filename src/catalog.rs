//! # Catalog
//!
//! Static title knowledge shared by every query:
//!
//! - the ordered alias table used to pick canonical titles,
//! - known Steam app ids used to pick cover images without a catalog search.
//!
//! Loaded once at startup (JSON file or the built-in seed) and then only read.

use serde::Deserialize;
use std::{fs, path::Path};
use tracing::warn;

use crate::alias::{AliasEntry, AliasTable};

/// A title pinned to a Steam app id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KnownId {
    pub title: String,
    pub app_id: u32,
}

/// Case-insensitive, exact-title lookup of Steam app ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownIds {
    entries: Vec<KnownId>,
}

impl KnownIds {
    pub fn new(entries: Vec<KnownId>) -> Self {
        Self { entries }
    }

    pub fn app_id_for(&self, title: &str) -> Option<u32> {
        let t = title.trim();
        self.entries
            .iter()
            .find(|k| k.title.trim().eq_ignore_ascii_case(t))
            .map(|k| k.app_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    aliases: Vec<AliasEntry>,
    #[serde(default)]
    known_ids: Vec<KnownId>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub aliases: AliasTable,
    pub known_ids: KnownIds,
}

impl Catalog {
    pub fn new(aliases: AliasTable, known_ids: KnownIds) -> Self {
        Self { aliases, known_ids }
    }

    /// Load from a JSON file. Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => match Self::from_json(&s) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid catalog file, using built-in seed");
                    Self::default_seed()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "catalog file unreadable, using built-in seed");
                Self::default_seed()
            }
        }
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let file: CatalogFile = serde_json::from_str(s)?;
        Ok(Self {
            aliases: AliasTable::new(file.aliases),
            known_ids: KnownIds::new(file.known_ids),
        })
    }

    /// Built-in seed. Order matters for the alias table.
    pub fn default_seed() -> Self {
        let aliases = AliasTable::new(vec![
            AliasEntry::new(
                "Red Dead Redemption 2",
                &[
                    "red dead redemption 2",
                    "red dead redemption 2 ultimate edition",
                    "red dead redemption 2 free download",
                    "red dead redemption 2 от decepticon",
                    "red dead redemption ii",
                ],
            ),
            AliasEntry::new(
                "Resident Evil 4",
                &[
                    "resident evil 4",
                    "resident evil 4 remake",
                    "resident evil remake",
                    "resident evil 4 gold edition",
                ],
            ),
            AliasEntry::new(
                "Resident Evil Village",
                &["resident evil village", "resident evil 8", "resident evil 8 village"],
            ),
            AliasEntry::new(
                "I Am President",
                &["i am president", "i am your president", "this is the president"],
            ),
            AliasEntry::new(
                "Dave the Diver",
                &["dave the diver", "dave the diver free download", "dave the diver v", "dave the diver:"],
            ),
        ]);

        let known = [
            ("Resident Evil 4", 2050650),
            ("Resident Evil Village", 1196590),
            ("I Am President", 2179800),
            ("Resident Evil 3", 952060),
            ("Resident Evil 2", 883710),
            ("Resident Evil 7", 418370),
            ("This Is the President", 2179800),
            ("Red Dead Redemption", 1446780),
            ("Red Dead Redemption 2", 1174180),
            ("Red Dead Redemption 2: Ultimate Edition", 1174180),
        ];
        let known_ids = KnownIds::new(
            known
                .into_iter()
                .map(|(title, app_id)| KnownId {
                    title: title.to_string(),
                    app_id,
                })
                .collect(),
        );

        Self { aliases, known_ids }
    }
}
