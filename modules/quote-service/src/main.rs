//! Quote Service: standalone binary hosting the quote generator core.
//!
//! Keeps an ordered list of quotes in a local SQLite key-value store,
//! filters it by category and periodically reconciles it against a public
//! mock REST endpoint. Hosts both an RPC API and a dashboard UI.
//! Default: http://127.0.0.1:9103/

mod categories;
mod config;
mod dashboard;
mod db;
mod error;
mod reconcile;
mod remote_api;
mod routes;
mod store;
mod transfer;
mod view;
mod worker;

use config::Config;
use routes::AppState;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use store::QuoteStore;
use worker::SyncContext;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    log::info!("Opening database at: {}", config.db_path);
    let database = match db::Db::open(&config.db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("Failed to open database {}: {}", config.db_path, e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(Mutex::new(QuoteStore::open(database)));
    log::info!("Loaded {} quotes", store::lock_store(&store).len());

    let sync = Arc::new(SyncContext {
        store: store.clone(),
        client: remote_api::http_client(Duration::from_secs(config.remote_timeout_secs)),
        remote_url: config.remote_url.clone(),
        remote_limit: config.remote_limit,
        last_sync: Arc::new(tokio::sync::Mutex::new(None)),
    });

    let state = Arc::new(AppState {
        store: store.clone(),
        sync: sync.clone(),
        rng: Mutex::new(Box::new(view::ThreadRandom)),
        start_time: Instant::now(),
        sync_interval_secs: config.sync_interval_secs,
        post_new_quotes: config.post_new_quotes,
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker_handle = if config.sync_interval_secs > 0 {
        let interval = config.sync_interval_secs;
        log::info!("Background sync started (interval: {}s)", interval);
        Some(tokio::spawn(worker::run_worker(sync, interval, shutdown_rx)))
    } else {
        log::warn!("QUOTE_SYNC_INTERVAL is 0, background sync disabled");
        None
    };

    let cors = tower_http::cors::CorsLayer::permissive();

    let app = axum::Router::new()
        .route("/", axum::routing::get(dashboard::dashboard))
        // Quotes
        .route("/rpc/quotes/view", axum::routing::get(routes::quotes_view))
        .route("/rpc/quotes/add", axum::routing::post(routes::quotes_add))
        .route(
            "/rpc/quotes/remove",
            axum::routing::post(routes::quotes_remove),
        )
        .route(
            "/rpc/quotes/random",
            axum::routing::post(routes::quotes_view),
        )
        .route(
            "/rpc/quotes/last_viewed",
            axum::routing::get(routes::quotes_last_viewed),
        )
        // Categories
        .route(
            "/rpc/categories/list",
            axum::routing::get(routes::categories_list),
        )
        .route(
            "/rpc/selection/change",
            axum::routing::post(routes::selection_change),
        )
        // Import / export
        .route(
            "/rpc/transfer/export",
            axum::routing::get(routes::transfer_export),
        )
        .route(
            "/rpc/transfer/import",
            axum::routing::post(routes::transfer_import),
        )
        // Service
        .route("/rpc/sync/run", axum::routing::post(routes::sync_run))
        .route("/rpc/status", axum::routing::get(routes::status))
        .with_state(state)
        .layer(cors);

    let addr = format!("127.0.0.1:{}", config.port);
    log::info!("Quote Service listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("Shutdown signal received");
        })
        .await;
    if let Err(e) = served {
        log::error!("Server error: {}", e);
    }

    // Stop the timer before the store goes away.
    shutdown_tx.send(true).ok();
    if let Some(handle) = worker_handle {
        handle.await.ok();
    }

    match Arc::try_unwrap(store) {
        Ok(store) => store
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .close(),
        Err(shared) => {
            store::lock_store(&shared).save();
        }
    }
}
