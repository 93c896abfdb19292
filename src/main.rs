use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshelf_api::{
    config::{Config, StorageBackend},
    db::{self, Cache, CatalogStore, InMemoryStore, PgStore, UserStore},
    routes::{create_router, AppState},
    services::providers::{GeminiReviewEnhancer, GoogleBooksProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (catalog, users): (Arc<dyn CatalogStore>, Arc<dyn UserStore>) =
        match config.storage_backend {
            StorageBackend::Postgres => {
                let pool = db::create_pool(&config.database_url).await?;
                db::run_migrations(&pool).await?;
                let store = PgStore::new(pool);
                let catalog: Arc<dyn CatalogStore> = Arc::new(store.clone());
                let users: Arc<dyn UserStore> = Arc::new(store);
                (catalog, users)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                let store = InMemoryStore::new();
                let catalog: Arc<dyn CatalogStore> = Arc::new(store.clone());
                let users: Arc<dyn UserStore> = Arc::new(store);
                (catalog, users)
            }
        };

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client).await;

    let metadata = Arc::new(GoogleBooksProvider::new(
        cache,
        config.google_books_api_key.clone(),
        config.google_books_api_url.clone(),
    ));

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; review enhancement is unavailable");
    }
    let enhancer = Arc::new(GeminiReviewEnhancer::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
    ));

    let state = Arc::new(AppState::new(catalog, users, metadata, enhancer));
    let app = create_router(state, config.frontend_uri.as_deref());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, backend = ?config.storage_backend, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
