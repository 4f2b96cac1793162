use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::finalize::{sort_results, GameData, SortKey};
use crate::image::{HttpImageResolver, ImageResolver, SteamCatalog, SteamImageResolver};
use crate::ingest::http::HttpFeedFetcher;
use crate::search::SearchService;

#[derive(Clone)]
pub struct AppState {
    pub search: SearchService,
    /// In-process cover lookup backing `/game-image`.
    pub covers: Arc<SteamImageResolver>,
}

impl AppState {
    pub fn new(search: SearchService, covers: Arc<SteamImageResolver>) -> Self {
        Self { search, covers }
    }

    /// Wire HTTP feeds, catalog and image lookup from configuration.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let catalog = Arc::new(match cfg.catalog_path.as_deref() {
            Some(p) => Catalog::load_from_file(p),
            None => Catalog::default_seed(),
        });
        let apps = Arc::new(SteamCatalog::load_from_file(&cfg.images.steam_games_path));
        let covers = Arc::new(SteamImageResolver::new(catalog.known_ids.clone(), apps));

        let images: Arc<dyn ImageResolver> = match cfg.images.resolver_url.as_deref() {
            Some(url) => Arc::new(HttpImageResolver::new(url, cfg.images.timeout_secs)?),
            None => covers.clone(),
        };
        let fetcher = Arc::new(HttpFeedFetcher::new(&cfg.fetch)?);

        let search = SearchService::new(cfg.sources.clone(), catalog, fetcher, images)
            .with_mode(cfg.fetch.mode);
        tracing::info!(
            sources = search.sources().len(),
            aliases = search.catalog().aliases.len(),
            known_ids = search.catalog().known_ids.len(),
            mode = ?cfg.fetch.mode,
            "search service ready"
        );
        Ok(Self::new(search, covers))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search))
        .route("/game-image", get(game_image))
        .layer(CorsLayer::very_permissive())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody { error: msg.into() }),
    )
}

#[derive(serde::Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    sort: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<GameData>>, ApiError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(bad_request("Query is required"));
    }
    let sort = match params.sort.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => Some(s.parse::<SortKey>().map_err(bad_request)?),
        None => None,
    };

    let games = state.search.search(query).await;
    let games = match sort {
        Some(key) => sort_results(games, key),
        None => games,
    };
    Ok(Json(games))
}

#[derive(serde::Deserialize)]
struct ImageParams {
    #[serde(default)]
    title: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageBody {
    image_url: Option<String>,
}

async fn game_image(
    State(state): State<AppState>,
    Query(params): Query<ImageParams>,
) -> Result<Json<ImageBody>, ApiError> {
    let title = params.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(bad_request("Title is required"));
    }
    Ok(Json(ImageBody {
        image_url: state.covers.lookup(title),
    }))
}
