use std::sync::Arc;

use anime_recommender::{
    config::Config,
    routes::{create_router, AppState},
    services::{
        providers::MyAnimeListProvider, CachingImageResolver, Recommender, RetryPolicy, Throttle,
    },
    store::{ArtifactStore, Cache},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Artifacts must be present and consistent before serving anything
    let store = Arc::new(ArtifactStore::load(
        &config.catalog_path,
        &config.similarity_path,
    )?);

    let throttle = Arc::new(Throttle::new(config.image_min_interval()));
    tracing::info!(
        min_interval_ms = throttle.min_interval().as_millis() as u64,
        retry_attempts = config.image_retry_attempts,
        cache_capacity = ?config.image_cache_capacity,
        "Configured image lookups"
    );
    let provider = MyAnimeListProvider::new(
        config.mal_client_id.clone(),
        config.mal_api_url.clone(),
        config.image_timeout(),
        throttle,
    )?;

    let resolver = CachingImageResolver::new(
        Arc::new(provider),
        Cache::new(config.image_cache_capacity),
        config.image_cache_ttl(),
        RetryPolicy {
            max_attempts: config.image_retry_attempts,
            delay: config.image_retry_delay(),
        },
        config.fallback_image_url.clone(),
    );

    let recommender = Recommender::new(store, Arc::new(resolver), config.recommendation_count);
    let app = create_router(Arc::new(AppState::new(Arc::new(recommender))));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
