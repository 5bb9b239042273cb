mod catalog;
mod config;
mod embedding;
mod errors;
mod matching;
mod models;
mod policy;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::CatalogStore;
use crate::config::{Config, EmbeddingBackend};
use crate::embedding::http::HttpEmbedderConfig;
use crate::embedding::{CachedEmbedder, EmbeddingProvider, HashEmbedder, HttpEmbedder};
use crate::matching::search::SearchSettings;
use crate::policy::PolicyTables;
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

    info!("Starting Jobscope API v{}", env!("CARGO_PKG_VERSION"));

    // Policy tables are fixed for the life of the process
    let policy = PolicyTables::load(config.policy_path.as_deref())
        .context("failed to load policy tables")?;

    // Catalog snapshot (reloadable via POST /api/v1/catalog/reload)
    let catalog = CatalogStore::open(config.catalog_path.clone(), policy.column_aliases.clone())
        .context("failed to load job catalog")?;

    // Embedding provider, shared by every request
    let provider = build_embedder(&config)?;
    info!(
        "Embedding provider initialized (model: {})",
        provider.model_id()
    );
    let embedder = Arc::new(CachedEmbedder::new(provider, config.embedding_cache_size));

    let state = AppState {
        catalog: Arc::new(catalog),
        embedder,
        policy: Arc::new(policy),
        search: SearchSettings {
            min_query_tokens: config.min_query_tokens,
            default_limit: config.search_limit,
        },
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the configured embedding backend.
fn build_embedder(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match &config.embedding {
        EmbeddingBackend::Hash { dimension } => Arc::new(HashEmbedder::new(*dimension)),
        EmbeddingBackend::OpenAi {
            base_url,
            api_key,
            model,
            dimensions,
        } => Arc::new(
            HttpEmbedder::new(HttpEmbedderConfig {
                base_url: base_url.clone(),
                api_key: api_key.clone(),
                model: model.clone(),
                dimensions: *dimensions,
                batch_size: config.embedding_batch_size,
            })
            .context("failed to build embedding HTTP client")?,
        ),
    };
    Ok(provider)
}
