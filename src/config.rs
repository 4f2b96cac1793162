// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::consolidate::FetchMode;
use crate::ingest::types::SourceDescriptor;

pub const ENV_CONFIG_PATH: &str = "REPACK_SEARCH_CONFIG";
pub const DEFAULT_TOML_PATH: &str = "config/app.toml";
pub const DEFAULT_JSON_PATH: &str = "config/app.json";

fn default_timeout_secs() -> u64 {
    15
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_max_retries() -> u8 {
    2
}
const MAX_BACKOFF_MS: u64 = 60_000;

fn default_backoff_ms() -> u64 {
    250
}
fn default_steam_games_path() -> String {
    "data/steam-games.json".to_string()
}
fn default_image_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Extra attempts after the first one, for transport errors and 5xx only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default)]
    pub mode: FetchMode,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            mode: FetchMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSettings {
    #[serde(default = "default_steam_games_path")]
    pub steam_games_path: String,
    /// Remote `/game-image` endpoint. When unset, lookups run in-process.
    #[serde(default)]
    pub resolver_url: Option<String>,
    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            steam_games_path: default_steam_games_path(),
            resolver_url: None,
            timeout_secs: default_image_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub images: ImageSettings,
    /// JSON alias/known-id catalog. Built-in seed when unset.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl AppConfig {
    /// Load from an explicit path. Supports TOML or JSON, picked by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = if ext == "json" {
            serde_json::from_str::<AppConfig>(&content).context("parsing json config")?
        } else {
            toml::from_str::<AppConfig>(&content).context("parsing toml config")?
        };
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $REPACK_SEARCH_CONFIG
    /// 2) config/app.toml
    /// 3) config/app.json
    /// 4) defaults (no sources)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Ok(Self::default())
    }

    fn sanitized(mut self) -> Self {
        self.sources = clean_sources(self.sources);
        if self.fetch.timeout_secs == 0 {
            self.fetch.timeout_secs = default_timeout_secs();
        }
        if self.fetch.connect_timeout_secs == 0 {
            self.fetch.connect_timeout_secs = default_connect_timeout_secs();
        }
        self.fetch.backoff_ms = self.fetch.backoff_ms.min(MAX_BACKOFF_MS);
        self.images.resolver_url = self
            .images
            .resolver_url
            .take()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self
    }
}

/// Trim, drop incomplete entries, keep the first of any duplicated name. Order is preserved.
fn clean_sources(items: Vec<SourceDescriptor>) -> Vec<SourceDescriptor> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let name = it.name.trim();
        let url = it.url.trim();
        if name.is_empty() || url.is_empty() {
            continue;
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            continue;
        }
        out.push(SourceDescriptor::new(name, url));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn toml_sources_are_cleaned_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("app.toml");
        fs::write(
            &p,
            r#"
[[sources]]
name = " DODI "
url = "https://example.test/dodi.json"

[[sources]]
name = ""
url = "https://example.test/empty.json"

[[sources]]
name = "FitGirl"
url = "https://example.test/fitgirl.json"

[[sources]]
name = "dodi"
url = "https://example.test/other.json"

[fetch]
max_retries = 4
mode = "concurrent"
"#,
        )
        .unwrap();
        let cfg = AppConfig::load_from(&p).unwrap();
        let names: Vec<_> = cfg.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["DODI", "FitGirl"]);
        assert_eq!(cfg.fetch.max_retries, 4);
        assert_eq!(cfg.fetch.mode, FetchMode::Concurrent);
        assert_eq!(cfg.fetch.timeout_secs, 15);
        assert_eq!(cfg.images.steam_games_path, "data/steam-games.json");
    }

    #[test]
    fn json_config_and_blank_resolver_url() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("app.json");
        fs::write(
            &p,
            r#"{"sources":[{"name":"A","url":"https://a.test/feed.json"}],"images":{"resolver_url":"  "}}"#,
        )
        .unwrap();
        let cfg = AppConfig::load_from(&p).unwrap();
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.images.resolver_url, None);
        assert_eq!(cfg.fetch.backoff_ms, 250);
    }

    #[test]
    fn absurd_backoff_is_clamped() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("app.toml");
        fs::write(&p, "[fetch]\nbackoff_ms = 9223372036854775807\n").unwrap();
        let cfg = AppConfig::load_from(&p).unwrap();
        assert_eq!(cfg.fetch.backoff_ms, 60_000);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        // No files in the temp CWD → defaults
        let v = AppConfig::load_default().unwrap();
        assert!(v.sources.is_empty());

        // Env wins
        let p = tmp.path().join("custom.json");
        fs::write(&p, r#"{"sources":[{"name":"X","url":"mem://x"}]}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let v2 = AppConfig::load_default().unwrap();
        assert_eq!(v2.sources, vec![SourceDescriptor::new("X", "mem://x")]);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(AppConfig::load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
