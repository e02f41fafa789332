mod auth;
mod config;
mod db;
mod errors;
mod extraction;
mod items;
mod models;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::AuthClient;
use crate::config::Config;
use crate::db::create_pool;
use crate::extraction::{FirecrawlClient, Location};
use crate::items::pipeline::ImportPipeline;
use crate::items::store::PgItemStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shelf API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize extraction service client
    let extractor =
        FirecrawlClient::new(&config.firecrawl_api_url, config.firecrawl_api_key.clone())?;
    info!("Extraction client initialized ({})", config.firecrawl_api_url);

    // Initialize auth provider client
    let sessions = AuthClient::new(&config.auth_url)?;
    info!("Auth client initialized ({})", config.auth_url);

    let location = Location {
        country: config.extract_country.clone(),
        languages: config.extract_languages.clone(),
    };
    let pipeline = ImportPipeline::new(
        Arc::new(PgItemStore::new(db)),
        Arc::new(extractor),
        location,
    );

    // Build app state
    let state = AppState {
        pipeline,
        sessions: Arc::new(sessions),
        config: config.clone(),
    };

    // Build router: request logging wraps everything, the session guard sits on item routes
    let app = build_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
