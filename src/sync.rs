// Sync Engine. Three per-source pullers run concurrently and fail independently, each
// swallowing its own errors into a `SyncLog` row rather than aborting its siblings.
// `tokio::join!` gives exactly that: every future runs to completion regardless of
// whether a sibling's page loop hit an error — unlike `futures::try_join!`, which would
// short-circuit on the first one.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::contracts::{SourceClient, Store};
use crate::normalize::normalize;
use crate::types::{SyncLog, SyncStatus};

const PAGE_SIZE_CAP: usize = 100;
const BATCH_TRANSACTION_SIZE: usize = 100;

/// Runs all three source pullers concurrently. Never returns an `Err` — per-source
/// failures are recorded in `SyncLog` and reflected only in the returned counts.
pub async fn sync_all(
    store: &(dyn Store),
    official: &(dyn SourceClient),
    glama: &(dyn SourceClient),
    smithery: &(dyn SourceClient),
) -> [u64; 3] {
    let (a, b, c) = tokio::join!(
        sync_source(store, official),
        sync_source(store, glama),
        sync_source(store, smithery),
    );
    [a, b, c]
}

/// One source's full pull-paginate-normalize-upsert loop. Swallows all errors into the
/// source's `SyncLog` row per §4.3 step 4-5 and always returns the count accumulated
/// before any failure.
pub async fn sync_source(store: &(dyn Store), client: &(dyn SourceClient)) -> u64 {
    let source = client.source();
    let last_sync = match store.get_last_sync(source).await {
        Ok(log) => log,
        Err(e) => {
            warn!(%source, error = %e, "failed to read prior sync log; proceeding with a full pull");
            None
        }
    };
    let updated_since = last_sync.as_ref().map(|l| l.last_synced_at);

    let mut cursor: Option<String> = None;
    let mut total: u64 = 0;
    let mut batch = Vec::with_capacity(BATCH_TRANSACTION_SIZE);

    loop {
        let page = match client.fetch_page(cursor.as_deref(), updated_since).await {
            Ok(p) => p,
            Err(e) => {
                warn!(%source, error = %e, "source puller failed; stopping pagination");
                flush_batch(store, &mut batch).await;
                record_result(store, source, total, Err(e.to_string())).await;
                return total;
            }
        };

        if page.entries.is_empty() && page.next_cursor.is_none() {
            break;
        }

        for raw in page.entries {
            batch.push(normalize(source, raw));
            total += 1;
            if batch.len() >= BATCH_TRANSACTION_SIZE.min(PAGE_SIZE_CAP) {
                flush_batch(store, &mut batch).await;
            }
        }

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    flush_batch(store, &mut batch).await;
    record_result(store, source, total, Ok(())).await;
    info!(%source, total, "sync completed");
    total
}

async fn flush_batch(store: &(dyn Store), batch: &mut Vec<crate::types::Server>) {
    if batch.is_empty() {
        return;
    }
    if let Err(e) = store.upsert_servers(batch).await {
        warn!(error = %e, count = batch.len(), "failed to upsert a batch; entries dropped for this run");
    }
    batch.clear();
}

async fn record_result(store: &(dyn Store), source: crate::types::Source, count: u64, outcome: Result<(), String>) {
    let log = match outcome {
        Ok(()) => SyncLog {
            source,
            last_synced_at: chrono::Utc::now(),
            server_count: count,
            status: SyncStatus::Ok,
            error: None,
        },
        Err(message) => SyncLog {
            source,
            last_synced_at: chrono::Utc::now(),
            server_count: count,
            status: SyncStatus::Error,
            error: Some(message),
        },
    };
    if let Err(e) = store.update_sync_log(&log).await {
        warn!(%source, error = %e, "failed to persist sync log");
    }
}

/// Owns the three `SourceClient`s so `SyncGate`/`CoreFacade` can hold one handle.
pub struct SyncEngine {
    pub official: Arc<dyn SourceClient>,
    pub glama: Arc<dyn SourceClient>,
    pub smithery: Arc<dyn SourceClient>,
}

impl SyncEngine {
    pub fn new(
        official: Arc<dyn SourceClient>,
        glama: Arc<dyn SourceClient>,
        smithery: Arc<dyn SourceClient>,
    ) -> Self {
        Self { official, glama, smithery }
    }

    pub async fn sync_all(&self, store: &(dyn Store)) -> [u64; 3] {
        sync_all(store, self.official.as_ref(), self.glama.as_ref(), self.smithery.as_ref()).await
    }
}
