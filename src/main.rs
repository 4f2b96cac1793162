//! repack-search: Binary Entrypoint
//! Boots the Axum HTTP server: config, feeds, catalog, metrics, routes.

use repack_search::{
    api::{self, AppState},
    config::AppConfig,
    metrics::Metrics,
};
use shuttle_axum::ShuttleAxum;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs filtered by `RUST_LOG` (default `repack_search=info,warn`).
/// The runtime may already own the global subscriber; that is fine.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("repack_search=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load_default()?;
    info!(
        sources = cfg.sources.len(),
        mode = ?cfg.fetch.mode,
        remote_images = cfg.images.resolver_url.is_some(),
        "config loaded"
    );

    let state = AppState::from_config(&cfg)?;
    let metrics = Metrics::init()?;
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
