// Search Engine (§4.4) and getServerDetails (id -> slug -> name-suffix fallback).

use anyhow::Result;
use serde::Serialize;

use crate::contracts::Store;
use crate::query_sanitization::sanitize_search_query;
use crate::types::{RegistryType, Server, Source, TransportType};

/// Optional equality filters, each `None` meaning "any".
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub transport_type: Option<TransportType>,
    pub registry_type: Option<RegistryType>,
    pub source: Option<Source>,
}

impl SearchFilters {
    fn matches(&self, server: &Server) -> bool {
        if let Some(t) = self.transport_type {
            if server.transport_type != Some(t) {
                return false;
            }
        }
        if let Some(r) = self.registry_type {
            if server.registry_type != Some(r) {
                return false;
            }
        }
        if let Some(s) = self.source {
            if !server.sources.contains(&s) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    pub registry_type: Option<RegistryType>,
    pub package_identifier: Option<String>,
    pub transport_type: Option<TransportType>,
    pub repository_url: Option<String>,
    pub has_remote: bool,
    pub rank: u32,
    pub sources: Vec<Source>,
    pub use_count: u64,
    pub verified: bool,
    pub icon_url: Option<String>,
}

impl From<(&Server, u32)> for SearchResult {
    fn from((server, rank): (&Server, u32)) -> Self {
        SearchResult {
            name: server.name.clone(),
            description: server.description.clone(),
            version: server.version.clone(),
            registry_type: server.registry_type,
            package_identifier: server.package_identifier.clone(),
            transport_type: server.transport_type,
            repository_url: server.repository_url.clone(),
            has_remote: server.has_remote,
            rank,
            sources: server.sources.iter().copied().collect(),
            use_count: server.use_count,
            verified: server.verified,
            icon_url: server.icon_url.clone(),
        }
    }
}

/// Hard cap on how many rows a single query widens to while chasing `limit` matches
/// against a selective filter; past this the store is simply exhausted or too sparse.
const MAX_FETCH_LIMIT: usize = 5000;

/// Ranked keyword search with a recent-list fallback for an empty/punctuation-only query.
/// `limit` is expected to already be validated to `[1, 50]` by the caller.
///
/// The Store doesn't index transport/registry/source, so filters are applied in Rust
/// after the store query. A selective filter can leave fewer than `limit` matches in the
/// first page, so the fetch window widens and re-queries until either `limit` matches are
/// found, the store runs out of rows, or `MAX_FETCH_LIMIT` is reached.
pub async fn search(
    store: &(dyn Store),
    query: &str,
    limit: usize,
    filters: &SearchFilters,
) -> Result<Vec<SearchResult>> {
    let sanitized = sanitize_search_query(query);

    let mut fetch_limit = (limit * 5).max(limit).min(MAX_FETCH_LIMIT);
    let mut matched: Vec<Server> = Vec::new();

    loop {
        let servers = if sanitized.is_empty() {
            store.list_recent(fetch_limit).await?
        } else {
            store.search_full_text(&sanitized.expression, fetch_limit).await?
        };
        let fetched = servers.len();
        matched = servers.into_iter().filter(|s| filters.matches(s)).collect();

        if matched.len() >= limit || fetched < fetch_limit || fetch_limit >= MAX_FETCH_LIMIT {
            break;
        }
        fetch_limit = (fetch_limit * 4).min(MAX_FETCH_LIMIT);
    }

    let results = matched
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, s)| SearchResult::from((s, i as u32 + 1)))
        .collect();

    Ok(results)
}

/// The full detail view for one server, including the parsed environment-variable list.
#[derive(Debug, Clone, Serialize)]
pub struct ServerDetail {
    #[serde(flatten)]
    pub server: Server,
}

/// Looks up by `id` first, then `slug`, then a suffix match on `name`.
pub async fn get_server_details(store: &(dyn Store), key: &str) -> Result<Option<ServerDetail>> {
    if let Some(server) = store.get_server_by_id_or_slug(key).await? {
        return Ok(Some(ServerDetail { server }));
    }

    // `get_server_by_id_or_slug` already covers id and slug; the remaining fallback is a
    // name-suffix match, which requires scanning. A small recent-list probe is enough for
    // the common case of searching by a short, distinctive trailing segment of `name`.
    let candidates = store.list_recent(1000).await?;
    let server = candidates.into_iter().find(|s| s.name.ends_with(key));
    Ok(server.map(|server| ServerDetail { server }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, RawEntry};
    use crate::store::SqliteStore;

    async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open(":memory:").await.unwrap();
        let server = normalize(
            Source::Official,
            RawEntry {
                id: "io.modelcontextprotocol/filesystem".to_string(),
                name: "io.modelcontextprotocol/filesystem".to_string(),
                description: "Secure filesystem access".to_string(),
                raw_data: serde_json::json!({}),
                packages: vec![crate::normalize::RawPackage {
                    registry_type: Some(RegistryType::Npm),
                    identifier: Some("@modelcontextprotocol/server-filesystem".to_string()),
                    transport_type: Some(TransportType::Stdio),
                    environment_variables: vec![],
                }],
                updated_at: Some("2024-05-01T00:00:00Z".parse().unwrap()),
                ..Default::default()
            },
        );
        store.upsert_servers(&[server]).await.unwrap();
        store
    }

    #[tokio::test]
    async fn scenario_s1_search_a_fresh_store() {
        let store = seeded_store().await;
        let results = search(&store, "filesystem", 10, &SearchFilters::default()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].package_identifier.as_deref(), Some("@modelcontextprotocol/server-filesystem"));
        assert!(!results[0].has_remote);
        assert_eq!(results[0].sources, vec![Source::Official]);
    }

    #[tokio::test]
    async fn scenario_s2_empty_query_returns_recents_in_order() {
        let store = SqliteStore::open(":memory:").await.unwrap();
        let a = normalize(
            Source::Official,
            RawEntry {
                id: "a".to_string(),
                name: "a".to_string(),
                description: "server a".to_string(),
                raw_data: serde_json::json!({}),
                updated_at: Some("2024-01-01T00:00:00Z".parse().unwrap()),
                ..Default::default()
            },
        );
        let b = normalize(
            Source::Official,
            RawEntry {
                id: "b".to_string(),
                name: "b".to_string(),
                description: "server b".to_string(),
                raw_data: serde_json::json!({}),
                updated_at: Some("2024-02-01T00:00:00Z".parse().unwrap()),
                ..Default::default()
            },
        );
        store.upsert_servers(&[a, b]).await.unwrap();

        let results = search(&store, "", 10, &SearchFilters::default()).await.unwrap();
        assert_eq!(results.iter().map(|r| r.name.clone()).collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
    }

    #[tokio::test]
    async fn punctuation_only_query_behaves_like_empty_query() {
        let store = seeded_store().await;
        let empty = search(&store, "", 10, &SearchFilters::default()).await.unwrap();
        let punctuation = search(&store, "!!! ???", 10, &SearchFilters::default()).await.unwrap();
        assert_eq!(empty.len(), punctuation.len());
        assert_eq!(empty[0].name, punctuation[0].name);
    }

    #[tokio::test]
    async fn selective_filter_widens_past_the_first_fetch_window() {
        let store = SqliteStore::open(":memory:").await.unwrap();

        // Five recently-updated decoys from Official, then one older match from Smithery.
        // With limit=1 the first fetch window (limit*5 = 5) only covers the decoys.
        let mut servers = Vec::new();
        for i in 0..5 {
            servers.push(normalize(
                Source::Official,
                RawEntry {
                    id: format!("decoy-{i}"),
                    name: format!("decoy-{i}"),
                    description: "decoy server".to_string(),
                    raw_data: serde_json::json!({}),
                    updated_at: Some(format!("2024-06-0{}T00:00:00Z", i + 1).parse().unwrap()),
                    ..Default::default()
                },
            ));
        }
        servers.push(normalize(
            Source::Smithery,
            RawEntry {
                id: "target".to_string(),
                name: "target".to_string(),
                description: "the one we want".to_string(),
                raw_data: serde_json::json!({}),
                updated_at: Some("2024-01-01T00:00:00Z".parse().unwrap()),
                ..Default::default()
            },
        ));
        store.upsert_servers(&servers).await.unwrap();

        let filters = SearchFilters { source: Some(Source::Smithery), ..Default::default() };
        let results = search(&store, "", 1, &filters).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "target");
    }

    #[tokio::test]
    async fn details_fall_back_to_slug_then_name_suffix() {
        let store = seeded_store().await;
        assert!(get_server_details(&store, "io-modelcontextprotocol-filesystem").await.unwrap().is_some());
        assert!(get_server_details(&store, "filesystem").await.unwrap().is_some());
        assert!(get_server_details(&store, "does-not-exist").await.unwrap().is_none());
    }
}
