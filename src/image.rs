// src/image.rs
//! Cover-image lookup for a canonical title.
//!
//! Resolvers answer `Ok(Some(url))`, `Ok(None)` for "no match", or an error.
//! Callers treat the last two the same way.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fs, path::Path, sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::catalog::KnownIds;
use crate::error::FetchError;

const STEAM_HEADER_CDN: &str = "https://cdn.cloudflare.steamstatic.com/steam/apps";

pub fn steam_header_url(app_id: u32) -> String {
    format!("{STEAM_HEADER_CDN}/{app_id}/header.jpg")
}

#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, title: &str) -> Result<Option<String>, FetchError>;
    fn name(&self) -> &'static str;
}

/// Resolver that never finds anything.
pub struct NoImages;

#[async_trait]
impl ImageResolver for NoImages {
    async fn resolve(&self, _title: &str) -> Result<Option<String>, FetchError> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAppId {
    Num(u32),
    Text(String),
}

#[derive(Deserialize)]
struct RawSteamApp {
    id: RawAppId,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamApp {
    pub id: u32,
    pub name: String,
    name_lower: String,
}

impl SteamApp {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        let name_lower = name.trim().to_lowercase();
        Self { id, name, name_lower }
    }
}

/// Steam app list (`[{ "id": "1174180", "name": "Red Dead Redemption 2" }, ...]`).
#[derive(Debug, Clone, Default)]
pub struct SteamCatalog {
    apps: Vec<SteamApp>,
}

impl SteamCatalog {
    pub fn new(apps: Vec<SteamApp>) -> Self {
        let apps = apps.into_iter().filter(|a| !a.name_lower.is_empty()).collect();
        Self { apps }
    }

    pub fn from_json(s: &str) -> Result<Self, FetchError> {
        let raw: Vec<RawSteamApp> = serde_json::from_str(s)?;
        let apps = raw
            .into_iter()
            .filter_map(|r| {
                let id = match r.id {
                    RawAppId::Num(n) => n,
                    RawAppId::Text(t) => t.trim().parse().ok()?,
                };
                Some(SteamApp::new(id, r.name))
            })
            .collect();
        Ok(Self::new(apps))
    }

    /// Missing or broken files give an empty catalog; images are optional.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let loaded = fs::read_to_string(path)
            .map_err(|e| FetchError::other(e.to_string()))
            .and_then(|s| Self::from_json(&s));
        match loaded {
            Ok(c) => {
                info!(path = %path.display(), apps = c.len(), "steam app list loaded");
                c
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "steam app list unavailable, image lookups limited to known ids");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Exact (case-insensitive) name first, else the longest app name the title contains.
    pub fn lookup(&self, title: &str) -> Option<u32> {
        let t = title.trim().to_lowercase();
        if t.is_empty() {
            return None;
        }
        if let Some(app) = self.apps.iter().find(|a| a.name_lower == t) {
            return Some(app.id);
        }
        self.apps
            .iter()
            .filter(|a| t.contains(a.name_lower.as_str()))
            .max_by_key(|a| a.name_lower.len())
            .map(|a| a.id)
    }
}

/// In-process resolver: pinned app ids first, then the Steam app list.
#[derive(Clone)]
pub struct SteamImageResolver {
    known_ids: KnownIds,
    apps: Arc<SteamCatalog>,
}

impl SteamImageResolver {
    pub fn new(known_ids: KnownIds, apps: Arc<SteamCatalog>) -> Self {
        Self { known_ids, apps }
    }

    pub fn lookup(&self, title: &str) -> Option<String> {
        self.known_ids
            .app_id_for(title)
            .or_else(|| self.apps.lookup(title))
            .map(steam_header_url)
    }
}

#[async_trait]
impl ImageResolver for SteamImageResolver {
    async fn resolve(&self, title: &str) -> Result<Option<String>, FetchError> {
        Ok(self.lookup(title))
    }

    fn name(&self) -> &'static str {
        "steam"
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageReply {
    #[serde(default)]
    image_url: Option<String>,
}

/// Remote resolver speaking the `GET <endpoint>?title=...` → `{ "imageUrl": ... }` contract.
#[derive(Clone)]
pub struct HttpImageResolver {
    client: Client,
    endpoint: String,
}

impl HttpImageResolver {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ImageResolver for HttpImageResolver {
    async fn resolve(&self, title: &str) -> Result<Option<String>, FetchError> {
        let rsp = self
            .client
            .get(&self.endpoint)
            .query(&[("title", title)])
            .send()
            .await?;
        let status = rsp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }
        let reply: ImageReply = serde_json::from_slice(&rsp.bytes().await?)?;
        Ok(reply.image_url.filter(|u| !u.trim().is_empty()))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::KnownId;

    fn apps() -> SteamCatalog {
        SteamCatalog::from_json(
            r#"[
                {"id": "1174180", "name": "Red Dead Redemption 2"},
                {"id": 1446780, "name": "Red Dead Redemption"},
                {"id": "not-a-number", "name": "Broken"},
                {"id": "1", "name": ""}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn catalog_skips_bad_rows() {
        assert_eq!(apps().len(), 2);
    }

    #[test]
    fn exact_name_beats_containment() {
        assert_eq!(apps().lookup("red dead redemption"), Some(1446780));
    }

    #[test]
    fn longest_contained_name_wins() {
        assert_eq!(apps().lookup("Red Dead Redemption 2 Ultimate"), Some(1174180));
        assert_eq!(apps().lookup("Hades"), None);
    }

    #[tokio::test]
    async fn known_ids_take_precedence() {
        let known = KnownIds::new(vec![KnownId {
            title: "Red Dead Redemption 2".into(),
            app_id: 42,
        }]);
        let r = SteamImageResolver::new(known, Arc::new(apps()));
        assert_eq!(
            r.resolve("red dead redemption 2").await.unwrap().as_deref(),
            Some("https://cdn.cloudflare.steamstatic.com/steam/apps/42/header.jpg")
        );
        assert_eq!(r.resolve("Hades").await.unwrap(), None);
    }
}
