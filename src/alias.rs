// src/alias.rs
//! Alias resolution: map a normalized key onto a canonical display title.
//!
//! The table is ordered. The first entry with a variant that contains the key,
//! or is contained by it, wins. Keys without a match are title-cased instead.

use serde::Deserialize;

/// One canonical title and the lower-cased variants that should map to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AliasEntry {
    pub title: String,
    pub variants: Vec<String>,
}

impl AliasEntry {
    pub fn new<S: Into<String>>(title: S, variants: &[&str]) -> Self {
        Self {
            title: title.into(),
            variants: variants.iter().map(|v| v.to_lowercase()).collect(),
        }
    }

    fn matches(&self, key: &str) -> bool {
        self.variants
            .iter()
            .any(|v| !v.is_empty() && (key.contains(v.as_str()) || v.contains(key)))
    }
}

/// Immutable, ordered alias table. Built once at startup and passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn new(entries: Vec<AliasEntry>) -> Self {
        // Variants are compared against lower-cased keys only.
        let entries = entries
            .into_iter()
            .filter(|e| !e.title.trim().is_empty())
            .map(|e| AliasEntry {
                title: e.title.trim().to_string(),
                variants: e
                    .variants
                    .iter()
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| !v.is_empty())
                    .collect(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// See [`resolve`].
    pub fn resolve(&self, normalized_key: &str) -> String {
        resolve(normalized_key, self)
    }
}

/// Resolve a normalized key against the table; first match in declaration order wins.
pub fn resolve(normalized_key: &str, table: &AliasTable) -> String {
    let key = normalized_key.to_lowercase();
    if !key.is_empty() {
        if let Some(entry) = table.entries.iter().find(|e| e.matches(&key)) {
            return entry.title.clone();
        }
    }
    capitalize_words(normalized_key)
}

/// Upper-case the first character of every space-delimited word, leave the rest as is.
pub fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
