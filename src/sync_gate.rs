// Sync Gate: ensures callers never read from an empty or badly stale store without at
// least attempting a refresh first, while never blocking a second caller behind a sync
// that's already running. A `tokio::sync::Mutex` guards the shared refresh attempt.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::contracts::Store;
use crate::sync::SyncEngine;
use crate::types::Source;

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(15 * 60);

/// Serializes sync attempts so concurrent callers don't trigger redundant upstream pulls.
pub struct SyncGate {
    store: Arc<dyn Store>,
    engine: SyncEngine,
    max_age: Duration,
    lock: Mutex<()>,
}

impl SyncGate {
    pub fn new(store: Arc<dyn Store>, engine: SyncEngine, max_age: Duration) -> Self {
        Self { store, engine, max_age, lock: Mutex::new(()) }
    }

    pub fn with_default_max_age(store: Arc<dyn Store>, engine: SyncEngine) -> Self {
        Self::new(store, engine, DEFAULT_MAX_AGE)
    }

    /// Pulls fresh data if the store looks empty or the Official Registry hasn't synced
    /// within `max_age`. A failed sync is logged but never surfaced — callers proceed
    /// against whatever data already exists.
    pub async fn ensure_fresh(&self) -> anyhow::Result<()> {
        if !self.is_stale().await? {
            return Ok(());
        }

        let _guard = self.lock.lock().await;
        // Re-check after acquiring the lock: another caller may have already refreshed
        // while we were waiting.
        if !self.is_stale().await? {
            return Ok(());
        }

        info!("store is stale, triggering a sync");
        let counts = self.engine.sync_all(self.store.as_ref()).await;
        info!(official = counts[0], glama = counts[1], smithery = counts[2], "sync finished");
        Ok(())
    }

    async fn is_stale(&self) -> anyhow::Result<bool> {
        let recent = self.store.list_recent(1).await?;
        if recent.is_empty() {
            return Ok(true);
        }

        match self.store.get_last_sync(Source::Official).await {
            Ok(Some(log)) => {
                let age = Utc::now().signed_duration_since(log.last_synced_at);
                let age = age.to_std().unwrap_or(Duration::ZERO);
                Ok(age > self.max_age)
            }
            Ok(None) => Ok(true),
            Err(e) => {
                warn!(error = %e, "failed to read official registry sync log; treating store as stale");
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{SourceClient, SourcePage};
    use crate::store::SqliteStore;
    use async_trait::async_trait;
    use chrono::DateTime;

    struct EmptyClient(Source);

    #[async_trait]
    impl SourceClient for EmptyClient {
        fn source(&self) -> Source {
            self.0
        }

        async fn fetch_page(
            &self,
            _cursor: Option<&str>,
            _updated_since: Option<DateTime<Utc>>,
        ) -> anyhow::Result<SourcePage> {
            Ok(SourcePage { entries: vec![], next_cursor: None })
        }
    }

    fn test_engine() -> SyncEngine {
        SyncEngine::new(
            Arc::new(EmptyClient(Source::Official)),
            Arc::new(EmptyClient(Source::Glama)),
            Arc::new(EmptyClient(Source::Smithery)),
        )
    }

    #[tokio::test]
    async fn empty_store_is_always_stale() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").await.unwrap());
        let gate = SyncGate::with_default_max_age(store.clone(), test_engine());
        assert!(gate.is_stale().await.unwrap());
        gate.ensure_fresh().await.unwrap();
        // Sync ran against empty upstreams, so the store is still empty, but a sync log
        // now exists for the official registry.
        let log = store.get_last_sync(Source::Official).await.unwrap();
        assert!(log.is_some());
    }

    #[tokio::test]
    async fn fresh_sync_log_is_not_stale() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").await.unwrap());
        store
            .upsert_servers(&[crate::normalize::normalize(
                Source::Official,
                crate::normalize::RawEntry {
                    id: "a".to_string(),
                    name: "a".to_string(),
                    description: "test server".to_string(),
                    raw_data: serde_json::json!({}),
                    ..Default::default()
                },
            )])
            .await
            .unwrap();
        store
            .update_sync_log(&crate::types::SyncLog {
                source: Source::Official,
                last_synced_at: Utc::now(),
                server_count: 1,
                status: crate::types::SyncStatus::Ok,
                error: None,
            })
            .await
            .unwrap();

        let gate = SyncGate::with_default_max_age(store, test_engine());
        assert!(!gate.is_stale().await.unwrap());
    }
}
