//! Background reconciler.
//!
//! Runs one sync cycle at startup and then every N seconds. Each tick
//! spawns its own cycle, so a hung fetch never holds back the next tick.
//! Cycles only touch the store after their fetch has resolved, under a
//! single lock, so overlapping cycles cannot interleave their writes.

use crate::remote_api;
use crate::store::{lock_store, now_millis, SharedStore};
use quote_types::SyncReport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

pub struct SyncContext {
    pub store: SharedStore,
    pub client: reqwest::Client,
    pub remote_url: String,
    pub remote_limit: usize,
    pub last_sync: Arc<Mutex<Option<SyncReport>>>,
}

/// Fetch the remote snapshot and merge it into the store.
pub async fn run_sync_cycle(ctx: &SyncContext) -> SyncReport {
    let fetched_at = now_millis();
    let remote = remote_api::fetch_remote(&ctx.client, &ctx.remote_url, ctx.remote_limit, fetched_at).await;

    let report = if remote.is_empty() {
        SyncReport {
            finished_at: chrono::Utc::now().to_rfc3339(),
            message: "Server sync skipped: no remote quotes available".to_string(),
            ..Default::default()
        }
    } else {
        let stats = lock_store(&ctx.store).merge_external(&remote);
        SyncReport {
            fetched: remote.len(),
            inserted: stats.inserted,
            replaced: stats.replaced,
            unchanged: stats.unchanged,
            finished_at: chrono::Utc::now().to_rfc3339(),
            message: if stats.changed() {
                format!(
                    "Synced with server: {} new, {} updated",
                    stats.inserted, stats.replaced
                )
            } else {
                "Synced with server: already up to date".to_string()
            },
        }
    };

    if report.fetched > 0 {
        log::info!("[SYNC] {}", report.message);
    }
    *ctx.last_sync.lock().await = Some(report.clone());
    report
}

pub async fn run_worker(
    ctx: Arc<SyncContext>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!("[SYNC] Worker started (interval: {}s)", interval_secs);

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                let stop = changed.is_err() || *shutdown.borrow();
                if stop {
                    break;
                }
            }
            _ = ticker.tick() => {
                let ctx = ctx.clone();
                in_flight.spawn(async move {
                    run_sync_cycle(&ctx).await;
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    log::error!("[SYNC] Sync cycle panicked: {}", e);
                }
            }
        }
    }

    in_flight.shutdown().await;
    log::info!("[SYNC] Worker stopped");
}
