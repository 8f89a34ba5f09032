use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use treasury_data_service::{
    api, cache, config::Config, db, explorer::ExplorerClient, registry::Registry, state::AppState,
    sync,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting treasury-data-service");

    let config = Config::from_env();
    let registry = Registry::from_env();
    tracing::info!(
        "Monitoring {} contracts via {}",
        registry.contracts().len(),
        config.explorer_api_url
    );

    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    tracing::info!("Database connection established");

    let cache = cache::init_cache(&config);
    tracing::info!(
        "Query cache initialized with TTL {:?} and capacity {}",
        config.cache_ttl,
        config.cache_max_capacity
    );

    let explorer = Arc::new(ExplorerClient::new(&config));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        registry,
        db_pool,
        cache,
        explorer,
        sweep_active: AtomicBool::new(false),
    });

    // Background sweep loop, cancelled on ctrl-c
    let shutdown = tokio_util::sync::CancellationToken::new();
    let scheduler_state = app_state.clone();
    let scheduler_shutdown = shutdown.clone();
    let scheduler_handle = tokio::spawn(async move {
        sync::start_scheduler(scheduler_state, scheduler_shutdown).await;
    });

    let app = api::create_router(app_state).layer(CorsLayer::permissive());
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    let _ = scheduler_handle.await;

    Ok(())
}
