use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mentorgraph::{
    api::{create_router, AppState},
    config::{Config, StoreBackend},
    error::AppError,
    store,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mentorgraph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting MentorGraph server v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded (wallet {}, space {})", config.wallet, config.space_id);

    // Connect the entity store backend
    let entity_store = store::connect(&config).await?;
    match &config.store {
        StoreBackend::Memory => tracing::info!("✅ In-memory entity store ready"),
        StoreBackend::Sqlite(url) => tracing::info!("✅ SQLite entity store ready: {}", url),
    }

    // Spawn background task for expired entity cleanup
    {
        let store = entity_store.clone();
        let every = Duration::from_secs(config.purge_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                match store.purge_expired().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("🧹 Purged {} expired entities", n),
                    Err(e) => tracing::error!("❌ Entity purge failed: {}", e),
                }
            }
        });
        tracing::info!("✅ Expiry purge task started (every {}s)", every.as_secs());
    }

    let addr = config.server_address();
    let state = AppState::new(entity_store, config);

    // Build router
    let app = create_router(state);

    // Bind and serve
    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("🏥 Health check: http://{}/api/health", addr);
    tracing::info!("");
    tracing::info!("📚 API Endpoints:");
    tracing::info!("  GET  /api/wallet   - Configured wallet address");
    tracing::info!("  GET  /api/asks     - List my asks");
    tracing::info!("  POST /api/asks     - Post an ask");
    tracing::info!("  GET  /api/offers   - List my offers");
    tracing::info!("  POST /api/offers   - Post an offer");
    tracing::info!("  GET  /api/profiles - List my profiles");
    tracing::info!("  POST /api/profiles - Create a profile");
    tracing::info!("  GET  /api/profile  - Raw profile entities");
    tracing::info!("  GET  /api/me       - Dashboard with reputation");
    tracing::info!("  POST /api/me       - createProfile | updateProfile | createAsk | createOffer");
    tracing::info!("  GET  /api/network  - Browse asks, offers, profiles, sessions");
    tracing::info!("");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
