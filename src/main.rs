//! StockScan Server
//!
//! Main entry point for the scan server.

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stockscan::{
    interaction::PromptBroker,
    realtime_hub::RealtimeHub,
    record_store::{RecordStore, SqlRecordStore},
    scan_feed::ScanFeed,
    scan_log::ScanLog,
    scan_workflow::ScanWorkflow,
    state::{AppConfig, AppState},
    web_api,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockscan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting StockScan server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        database_url = %config.database_url,
        host = %config.host,
        port = config.port,
        prompt_timeout_sec = config.prompt_timeout_sec,
        "Configuration loaded"
    );

    // Create database pool
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await?;

    tracing::info!("Database connected");

    SqlRecordStore::ensure_schema(&pool).await?;
    tracing::info!("scanned_items table ready");

    // Initialize components
    let hub = Arc::new(RealtimeHub::new());
    let broker = Arc::new(PromptBroker::new(
        hub.clone(),
        Duration::from_secs(config.prompt_timeout_sec),
    ));
    let scan_log = Arc::new(ScanLog::new(config.scan_log_capacity));
    let store: Arc<dyn RecordStore> = Arc::new(SqlRecordStore::new(pool.clone()));

    let workflow = Arc::new(ScanWorkflow::new(
        store.clone(),
        broker.clone(),
        scan_log.clone(),
    ));
    tracing::info!("ScanWorkflow initialized");

    let feed = Arc::new(ScanFeed::new(config.scan_feed_capacity));
    feed.start(workflow.clone()).await;

    // Create application state
    let state = AppState {
        pool,
        config,
        store,
        hub,
        broker,
        workflow,
        feed,
        scan_log,
        started_at: Instant::now(),
    };

    // Create router with static file serving for the operator UI
    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "./frontend/dist".to_string());
    let serve_dir = ServeDir::new(&static_dir)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir)));

    let app = web_api::create_router(state.clone())
        .fallback_service(serve_dir)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!(static_dir = %static_dir, "Static file serving enabled");

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
