// Core Facade (§4.8): the narrow set of operations exposed to an MCP host. Each
// operation validates its inputs, calls `ensure_fresh`, then delegates to the
// appropriate engine, wrapped in `observability::with_trace_id`.

use std::sync::Arc;

use anyhow::Result;

use crate::contracts::Store;
use crate::errors::CoreError;
use crate::install::{generate_install, InstallPayload};
use crate::observability::with_trace_id;
use crate::search::{get_server_details, search, SearchFilters, SearchResult, ServerDetail};
use crate::sync_gate::SyncGate;
use crate::types::Client;
use crate::validation::{validate_category, validate_key, validate_search_limit};

pub struct CoreFacade {
    store: Arc<dyn Store>,
    gate: SyncGate,
}

impl CoreFacade {
    pub fn new(store: Arc<dyn Store>, gate: SyncGate) -> Self {
        Self { store, gate }
    }

    pub async fn search_servers(
        &self,
        query: &str,
        limit: usize,
        filters: SearchFilters,
    ) -> Result<Vec<SearchResult>> {
        with_trace_id("search_servers", async {
            let limit = validate_search_limit(limit).map_err(anyhow::Error::from)?;
            self.gate.ensure_fresh().await?;
            search(self.store.as_ref(), query, limit, &filters).await
        })
        .await
    }

    pub async fn get_server_details(&self, key: &str) -> Result<Option<ServerDetail>> {
        with_trace_id("get_server_details", async {
            let key = validate_key(key).map_err(anyhow::Error::from)?;
            self.gate.ensure_fresh().await?;
            get_server_details(self.store.as_ref(), key).await
        })
        .await
    }

    pub async fn get_install_command(&self, key: &str, client: Client) -> Result<Option<InstallPayload>> {
        with_trace_id("get_install_command", async {
            let key = validate_key(key).map_err(anyhow::Error::from)?;
            self.gate.ensure_fresh().await?;
            let detail = get_server_details(self.store.as_ref(), key).await?;
            Ok(detail.map(|d| generate_install(&d.server, client)))
        })
        .await
    }

    pub async fn list_categories(&self) -> Result<Vec<(String, u64)>> {
        with_trace_id("list_categories", async {
            self.gate.ensure_fresh().await?;
            self.store.list_category_counts().await
        })
        .await
    }

    pub async fn browse_category(&self, category: &str, limit: usize) -> Result<Vec<SearchResult>> {
        with_trace_id("browse_category", async {
            let category = validate_category(category).map_err(anyhow::Error::from)?;
            self.gate.ensure_fresh().await?;
            let servers = self.store.list_by_category(category, limit).await?;
            Ok(servers
                .iter()
                .enumerate()
                .map(|(i, s)| SearchResult::from((s, i as u32 + 1)))
                .collect())
        })
        .await
    }
}

impl From<CoreError> for anyhow::Error {
    fn from(e: CoreError) -> Self {
        anyhow::Error::new(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, RawEntry};
    use crate::store::SqliteStore;
    use crate::sync::SyncEngine;
    use crate::types::Source;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    struct EmptyClient(Source);

    #[async_trait]
    impl crate::contracts::SourceClient for EmptyClient {
        fn source(&self) -> Source {
            self.0
        }

        async fn fetch_page(
            &self,
            _cursor: Option<&str>,
            _updated_since: Option<DateTime<Utc>>,
        ) -> Result<crate::contracts::SourcePage> {
            Ok(crate::contracts::SourcePage { entries: vec![], next_cursor: None })
        }
    }

    async fn facade_with_seed() -> CoreFacade {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").await.unwrap());
        let server = normalize(
            Source::Official,
            RawEntry {
                id: "io.modelcontextprotocol/filesystem".to_string(),
                name: "io.modelcontextprotocol/filesystem".to_string(),
                description: "Secure filesystem access".to_string(),
                raw_data: serde_json::json!({}),
                ..Default::default()
            },
        );
        store.upsert_servers(&[server]).await.unwrap();

        let engine = SyncEngine::new(
            Arc::new(EmptyClient(Source::Official)),
            Arc::new(EmptyClient(Source::Glama)),
            Arc::new(EmptyClient(Source::Smithery)),
        );
        let gate = SyncGate::with_default_max_age(store.clone(), engine);
        CoreFacade::new(store, gate)
    }

    #[tokio::test]
    async fn search_rejects_out_of_range_limit() {
        let facade = facade_with_seed().await;
        let result = facade.search_servers("filesystem", 0, SearchFilters::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn search_finds_seeded_server() {
        let facade = facade_with_seed().await;
        let results = facade.search_servers("filesystem", 10, SearchFilters::default()).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn install_command_returns_none_for_unknown_key() {
        let facade = facade_with_seed().await;
        let result = facade.get_install_command("does-not-exist", Client::Cursor).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn browse_category_rejects_unknown_category() {
        let facade = facade_with_seed().await;
        let result = facade.browse_category("not-a-real-category", 10).await;
        assert!(result.is_err());
    }
}
