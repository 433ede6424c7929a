use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_core::{
    load_config, validate_config, CacheStore, CatalogFetcher, MetadataSource, RefreshPipeline,
    RefreshScheduler, SnapshotStorage, TmdbClient,
};
use marquee_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MARQUEE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Cache directory: {:?}", config.cache.dir);
    info!(
        "Discover: {} combination(s), page cap {}",
        config.discover.combinations.len(),
        config.discover.page_cap
    );

    // Load the last snapshot; missing or corrupt files start empty
    let store = Arc::new(CacheStore::open(SnapshotStorage::new(&config.cache.dir)));
    let stats = store.stats();
    info!(
        "Cache loaded: {} catalog entries, {} metadata rows (fetched at {:?})",
        stats.catalog_entries, stats.metadata_entries, stats.fetched_at
    );

    // Create TMDB client
    let source: Arc<dyn MetadataSource> = Arc::new(
        TmdbClient::new(config.tmdb.clone()).context("Failed to create TMDB client")?,
    );

    // Create refresh pipeline and scheduler
    let fetcher = CatalogFetcher::from_config(source, &config.discover);
    let pipeline = Arc::new(RefreshPipeline::new(
        fetcher,
        config.discover.combinations.clone(),
        Arc::clone(&store),
    ));
    let scheduler = Arc::new(RefreshScheduler::new(
        config.schedule.clone(),
        config.cache.staleness(),
        pipeline,
    ));
    scheduler.start().await;
    info!(
        "Refresh scheduler started (daily at {} UTC)",
        config.schedule.refresh_at.format("%H:%M")
    );

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&store),
        Arc::clone(&scheduler),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    scheduler.stop().await;
    info!("Refresh scheduler stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
