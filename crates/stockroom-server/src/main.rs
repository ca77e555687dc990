//! Stockroom Server
//!
//! Inventory service keeping an authoritative SQLite product table and an
//! indexed in-memory cache mirror in sync: one full reconciliation at
//! startup, incremental write-through on every mutation afterwards. Reads
//! are served from the mirror's search index.

mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use stockroom_core::{CacheBackend, StockError};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use services::{CatalogService, IndexManager, ProductMirror, SearchService, Synchronizer};
use storage::{Database, MemoryStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub search: Arc<SearchService>,
    pub synchronizer: Arc<Synchronizer>,
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Stockroom Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = load_config()
        .await
        .context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}",
        config.bind_address, config.database_path
    );

    // Initialize the authoritative record store
    let db = Arc::new(
        Database::new(&config.database_path)
            .await
            .context("Failed to initialize database")?,
    );

    // Initialize the in-memory cache backend
    let cache: Arc<dyn CacheBackend> = Arc::new(MemoryStore::new());
    info!("In-memory cache initialized");

    // Wire up services; everything is constructed here, no globals
    let index = IndexManager::new(cache.clone());
    let mirror = ProductMirror::new(cache.clone());
    let synchronizer = Arc::new(Synchronizer::new(
        db.clone(),
        cache.clone(),
        index,
        mirror.clone(),
    ));
    let catalog = Arc::new(CatalogService::new(db, mirror));
    let search = Arc::new(SearchService::new(cache));

    // One full reconciliation before accepting traffic. A partially failed
    // pass still serves; the gaps heal on the next reconcile. A store or
    // index failure aborts startup.
    info!("Running startup reconciliation...");
    match synchronizer.reconcile().await {
        Ok(count) => info!("Cache mirror populated with {} products", count),
        Err(StockError::ReconciliationPartial { synced, failures }) => {
            warn!(
                "Startup reconciliation partial: {} synced, {} failed",
                synced,
                failures.len()
            );
            for failure in &failures {
                warn!("  product {}: {}", failure.id, failure.reason);
            }
        }
        Err(e) => return Err(e).context("Startup reconciliation failed"),
    }

    let state = AppState {
        catalog,
        search,
        synchronizer,
    };

    let app = Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(handlers::products::find_all).post(handlers::products::create),
        )
        .route(
            "/products/:id",
            get(handlers::products::find_by_id)
                .put(handlers::products::update)
                .delete(handlers::products::delete),
        )
        .route("/reconcile", post(handlers::products::reconcile))
        // Authoritative reads bypassing the cache
        .route("/store/products", get(handlers::products::list_store))
        .route("/store/products/:id", get(handlers::products::get_store))
}

#[derive(Debug, Clone)]
struct Config {
    bind_address: String,
    database_path: String,
}

async fn load_config() -> Result<Config> {
    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"));

    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
        let path = data_dir.join("stockroom.db");
        path.to_string_lossy().to_string()
    });

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    Ok(Config {
        bind_address,
        database_path,
    })
}
