use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recommandateur_api::api::{create_router, AppState};
use recommandateur_api::config::{Config, StoreBackend};
use recommandateur_api::db::{KvStore, MemoryStore, RedisStore};
use recommandateur_api::services::AllocineSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recommandateur_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn KvStore> = match config.store_backend {
        StoreBackend::Redis => Arc::new(
            RedisStore::connect(&config.redis_url)
                .await
                .context("Failed to connect to Redis")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, lists are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let source = AllocineSource::new(
        config.allocine_api_url.clone(),
        config.allocine_partner_code.clone(),
        config.catalog_result_count,
        Duration::from_secs(config.catalog_timeout_secs),
    )
    .context("Failed to build catalog client")?;

    let (state, writer) = AppState::new(store, Arc::new(source));
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, backend = ?config.store_backend, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    writer.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
