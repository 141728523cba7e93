//! Axum route handlers for the quote RPC API.
//!
//! This is the command surface a UI shell drives. Every mutating command
//! answers with the fresh `QuoteView` so the caller can re-render.

use crate::categories::{categories, resolve_selection};
use crate::error::QuoteError;
use crate::remote_api;
use crate::store::{lock_store, QuoteStore, SharedStore};
use crate::transfer;
use crate::view::{self, RandomSource};
use crate::worker::{self, SyncContext};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use quote_types::*;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

pub struct AppState {
    pub store: SharedStore,
    pub sync: Arc<SyncContext>,
    pub rng: Mutex<Box<dyn RandomSource>>,
    pub start_time: Instant,
    pub sync_interval_secs: u64,
    pub post_new_quotes: bool,
}

impl AppState {
    /// Run `f` with the store and the highlight source locked together.
    /// Lock order is always store, then rng.
    fn with_store<R>(&self, f: impl FnOnce(&mut QuoteStore, &mut dyn RandomSource) -> R) -> R {
        let mut store = lock_store(&self.store);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store, rng.as_mut())
    }
}

fn error_status(e: &QuoteError) -> StatusCode {
    match e {
        QuoteError::Validation(_) | QuoteError::Format(_) => StatusCode::BAD_REQUEST,
        QuoteError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =====================================================
// Quote Endpoints
// =====================================================

// GET /rpc/quotes/view, POST /rpc/quotes/random
// Every projection draws a fresh highlight.
pub async fn quotes_view(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<QuoteView>>) {
    let view = state.with_store(|store, rng| view::current_view(store, rng));
    (StatusCode::OK, Json(RpcResponse::ok(view)))
}

// POST /rpc/quotes/add
pub async fn quotes_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddQuoteRequest>,
) -> (StatusCode, Json<RpcResponse<QuoteView>>) {
    let result = state.with_store(|store, rng| {
        let quote = store.add(&req.text, &req.category)?;
        Ok::<_, QuoteError>((quote, view::current_view(store, rng)))
    });

    match result {
        Ok((quote, view)) => {
            if state.post_new_quotes {
                let sync = state.sync.clone();
                tokio::spawn(async move {
                    remote_api::post_quote(&sync.client, &sync.remote_url, &quote).await;
                });
            }
            (StatusCode::OK, Json(RpcResponse::ok(view)))
        }
        Err(e) => (error_status(&e), Json(RpcResponse::err(e.to_string()))),
    }
}

// POST /rpc/quotes/remove
pub async fn quotes_remove(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemoveQuoteRequest>,
) -> (StatusCode, Json<RpcResponse<QuoteView>>) {
    let view = state.with_store(|store, rng| {
        store.remove(&req.id);
        view::current_view(store, rng)
    });
    (StatusCode::OK, Json(RpcResponse::ok(view)))
}

// GET /rpc/quotes/last_viewed
pub async fn quotes_last_viewed(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Option<Quote>>>) {
    let last = lock_store(&state.store).last_viewed();
    (StatusCode::OK, Json(RpcResponse::ok(last)))
}

// =====================================================
// Category Endpoints
// =====================================================

// GET /rpc/categories/list
pub async fn categories_list(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Vec<String>>>) {
    let cats: Vec<String> = {
        let store = lock_store(&state.store);
        categories(store.quotes()).map(str::to_string).collect()
    };
    (StatusCode::OK, Json(RpcResponse::ok(cats)))
}

// POST /rpc/selection/change
pub async fn selection_change(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangeSelectionRequest>,
) -> (StatusCode, Json<RpcResponse<QuoteView>>) {
    let view = state.with_store(|store, rng| view::change_selection(store, &req.selection, rng));
    (StatusCode::OK, Json(RpcResponse::ok(view)))
}

// =====================================================
// Import / Export Endpoints
// =====================================================

// GET /rpc/transfer/export
pub async fn transfer_export(State(state): State<Arc<AppState>>) -> Response {
    let doc = transfer::export_document(&lock_store(&state.store));
    match doc {
        Ok(doc) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", transfer::EXPORT_FILE_NAME),
                ),
            ],
            doc,
        )
            .into_response(),
        Err(e) => (
            error_status(&e),
            Json(RpcResponse::<()>::err(e.to_string())),
        )
            .into_response(),
    }
}

// POST /rpc/transfer/import
pub async fn transfer_import(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> (StatusCode, Json<RpcResponse<ImportSummary>>) {
    let result = transfer::import_document(&mut lock_store(&state.store), &req.document);
    match result {
        Ok(summary) => (StatusCode::OK, Json(RpcResponse::ok(summary))),
        Err(e) => {
            log::warn!("[IMPORT] Rejected document: {}", e);
            (error_status(&e), Json(RpcResponse::err(e.to_string())))
        }
    }
}

// =====================================================
// Service Endpoints
// =====================================================

// POST /rpc/sync/run
pub async fn sync_run(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<SyncReport>>) {
    let report = worker::run_sync_cycle(&state.sync).await;
    (StatusCode::OK, Json(RpcResponse::ok(report)))
}

// GET /rpc/status
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<ServiceStatus>>) {
    let last_sync = state.sync.last_sync.lock().await.clone();
    let (total_quotes, category_count, selected_category) = {
        let store = lock_store(&state.store);
        (
            store.len(),
            categories(store.quotes()).count(),
            resolve_selection(store.quotes(), &store.persisted_selection()),
        )
    };

    let status = ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        total_quotes,
        categories: category_count,
        selected_category,
        last_sync,
        sync_interval_secs: state.sync_interval_secs,
        remote_url: state.sync.remote_url.clone(),
    };

    (StatusCode::OK, Json(RpcResponse::ok(status)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use crate::remote_api::tests::unreachable_url;
    use crate::view::tests::FixedRandom;

    async fn app_state() -> Arc<AppState> {
        let store = Arc::new(Mutex::new(QuoteStore::open(Arc::new(
            Db::open(":memory:").unwrap(),
        ))));
        let sync = Arc::new(SyncContext {
            store: store.clone(),
            client: reqwest::Client::new(),
            remote_url: unreachable_url().await,
            remote_limit: 5,
            last_sync: Arc::new(tokio::sync::Mutex::new(None)),
        });
        Arc::new(AppState {
            store,
            sync,
            rng: Mutex::new(Box::new(FixedRandom(0))),
            start_time: Instant::now(),
            sync_interval_secs: 30,
            post_new_quotes: false,
        })
    }

    #[tokio::test]
    async fn test_add_then_filter() {
        let state = app_state().await;
        let (code, Json(resp)) = quotes_add(
            State(state.clone()),
            Json(AddQuoteRequest {
                text: "Less is more.".to_string(),
                category: "Design".to_string(),
            }),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(resp.data.unwrap().visible.len(), 4);

        let (_, Json(resp)) = selection_change(
            State(state.clone()),
            Json(ChangeSelectionRequest {
                selection: "Design".to_string(),
            }),
        )
        .await;
        let view = resp.data.unwrap();
        assert_eq!(view.visible.len(), 1);
        assert_eq!(view.highlight.unwrap().text, "Less is more.");

        let (_, Json(resp)) = quotes_last_viewed(State(state)).await;
        assert_eq!(resp.data.unwrap().unwrap().text, "Less is more.");
    }

    #[tokio::test]
    async fn test_add_blank_is_bad_request() {
        let state = app_state().await;
        let (code, Json(resp)) = quotes_add(
            State(state.clone()),
            Json(AddQuoteRequest {
                text: " ".to_string(),
                category: "Design".to_string(),
            }),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert!(!resp.success);
        assert_eq!(lock_store(&state.store).len(), 3);
    }

    #[tokio::test]
    async fn test_remove_unknown_is_ok() {
        let state = app_state().await;
        let (code, Json(resp)) = quotes_remove(
            State(state),
            Json(RemoveQuoteRequest {
                id: "id-missing".to_string(),
            }),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(resp.data.unwrap().visible.len(), 3);
    }

    #[tokio::test]
    async fn test_import_rejects_object_document() {
        let state = app_state().await;
        let (code, _) = transfer_import(
            State(state.clone()),
            Json(ImportRequest {
                document: r#"{"text":"x","category":"y"}"#.to_string(),
            }),
        )
        .await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(lock_store(&state.store).len(), 3);
    }

    #[tokio::test]
    async fn test_export_sets_attachment_headers() {
        let state = app_state().await;
        let resp = transfer_export(State(state)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("quotes.json"));
    }

    #[tokio::test]
    async fn test_sync_failure_is_soft() {
        let state = app_state().await;
        let (code, Json(resp)) = sync_run(State(state.clone())).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(resp.data.unwrap().fetched, 0);

        let (_, Json(resp)) = status(State(state)).await;
        let status = resp.data.unwrap();
        assert_eq!(status.total_quotes, 3);
        assert_eq!(status.selected_category, "all");
        assert!(status.last_sync.is_some());
    }
}
