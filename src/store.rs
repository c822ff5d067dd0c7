// SQLite-backed Store: `FromRow` row structs, `ON CONFLICT ... DO UPDATE` upserts within
// a single transaction, and an FTS5 external-content table for full-text search. Embedded
// SQLite rather than a client/server database, since the whole store fits in one file and
// needs durable single-process WAL writes, not a shared server.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteConnectOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::contracts::Store;
use crate::types::{EnvVar, RegistryType, Server, Slug, Source, SyncLog, SyncStatus, TransportType};

const STALE_HORIZON_DAYS: i64 = 30;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS servers (
                row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                slug TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                version TEXT,
                categories_json TEXT NOT NULL,
                keywords_json TEXT NOT NULL,
                registry_type TEXT,
                package_identifier TEXT,
                transport_type TEXT,
                has_remote INTEGER NOT NULL,
                remote_url TEXT,
                sources_json TEXT NOT NULL,
                raw_data_json TEXT NOT NULL,
                last_synced_at TEXT NOT NULL,
                repository_url TEXT,
                repository_source TEXT,
                published_at TEXT,
                updated_at TEXT,
                status TEXT NOT NULL,
                use_count INTEGER NOT NULL,
                verified INTEGER NOT NULL,
                icon_url TEXT,
                environment_variables_json TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create servers table")?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_servers_slug ON servers(slug)")
            .execute(&self.pool)
            .await
            .context("failed to create slug index")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_servers_updated_at ON servers(updated_at)")
            .execute(&self.pool)
            .await
            .context("failed to create updated_at index")?;

        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS servers_fts USING fts5(
                name, description, keywords_text,
                content='servers', content_rowid='row_id'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create servers_fts table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sync_log (
                source TEXT PRIMARY KEY,
                last_synced_at TEXT NOT NULL,
                server_count INTEGER NOT NULL,
                status TEXT NOT NULL,
                error TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create sync_log table")?;

        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    #[instrument]
    async fn open(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // A single in-memory connection is intentional: pooling multiple connections
        // against `:memory:` would give each one its own empty database.
        let max_connections = if path == ":memory:" { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("failed to open sqlite store")?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    #[instrument(skip(self, servers))]
    async fn upsert_servers(&self, servers: &[Server]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for server in servers {
            server
                .check_invariants()
                .map_err(|e| anyhow::anyhow!("server {} failed invariants: {e}", server.id))?;

            // `sources` is unioned with any existing row rather than overwritten: once a
            // source has seen an id, that attribution is never lost (§4.3 merge policy).
            let existing_sources: Option<String> =
                sqlx::query_scalar("SELECT sources_json FROM servers WHERE id = ?")
                    .bind(&server.id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("failed to read existing sources")?;

            let mut merged_sources: IndexSet<Source> = match existing_sources {
                Some(json) => serde_json::from_str(&json)?,
                None => IndexSet::new(),
            };
            merged_sources.extend(server.sources.iter().copied());
            let merged_sources_json = serde_json::to_string(&merged_sources)?;

            let row_id: i64 = sqlx::query(
                r#"
                INSERT INTO servers (
                    id, slug, name, description, version, categories_json, keywords_json,
                    registry_type, package_identifier, transport_type, has_remote, remote_url,
                    sources_json, raw_data_json, last_synced_at, repository_url,
                    repository_source, published_at, updated_at, status, use_count, verified,
                    icon_url, environment_variables_json
                ) VALUES (
                    ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
                )
                ON CONFLICT(id) DO UPDATE SET
                    slug = excluded.slug,
                    name = excluded.name,
                    description = excluded.description,
                    version = excluded.version,
                    categories_json = excluded.categories_json,
                    keywords_json = excluded.keywords_json,
                    registry_type = excluded.registry_type,
                    package_identifier = excluded.package_identifier,
                    transport_type = excluded.transport_type,
                    has_remote = excluded.has_remote,
                    remote_url = excluded.remote_url,
                    sources_json = excluded.sources_json,
                    raw_data_json = excluded.raw_data_json,
                    last_synced_at = excluded.last_synced_at,
                    repository_url = excluded.repository_url,
                    repository_source = excluded.repository_source,
                    published_at = excluded.published_at,
                    updated_at = excluded.updated_at,
                    status = excluded.status,
                    use_count = excluded.use_count,
                    verified = excluded.verified,
                    icon_url = excluded.icon_url,
                    environment_variables_json = excluded.environment_variables_json
                RETURNING row_id
                "#,
            )
            .bind(&server.id)
            .bind(server.slug.as_str())
            .bind(&server.name)
            .bind(&server.description)
            .bind(&server.version)
            .bind(serde_json::to_string(&server.categories)?)
            .bind(serde_json::to_string(&server.keywords)?)
            .bind(server.registry_type.map(|t| t.as_str()))
            .bind(&server.package_identifier)
            .bind(server.transport_type.map(|t| t.as_str()))
            .bind(server.has_remote)
            .bind(&server.remote_url)
            .bind(&merged_sources_json)
            .bind(server.raw_data.to_string())
            .bind(server.last_synced_at)
            .bind(&server.repository_url)
            .bind(&server.repository_source)
            .bind(server.published_at)
            .bind(server.updated_at)
            .bind(&server.status)
            .bind(server.use_count as i64)
            .bind(server.verified)
            .bind(&server.icon_url)
            .bind(serde_json::to_string(&server.environment_variables)?)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("failed to upsert server {}", server.id))?
            .get(0);

            let keywords_text = server.keywords.iter().cloned().collect::<Vec<_>>().join(" ");
            sqlx::query(
                "INSERT OR REPLACE INTO servers_fts (rowid, name, description, keywords_text) VALUES (?, ?, ?, ?)",
            )
            .bind(row_id)
            .bind(&server.name)
            .bind(&server.description)
            .bind(keywords_text)
            .execute(&mut *tx)
            .await
            .context("failed to update fts index")?;
        }

        tx.commit().await.context("failed to commit upsert transaction")?;
        debug!(count = servers.len(), "upserted servers");
        Ok(())
    }

    async fn get_server_by_id_or_slug(&self, key: &str) -> Result<Option<Server>> {
        let by_id_sql = server_select("WHERE id = ?", "");
        let row = sqlx::query(&by_id_sql).bind(key).bind(1i64).fetch_optional(&self.pool).await?;

        let row = match row {
            Some(r) => Some(r),
            None => {
                let by_slug_sql = server_select("WHERE slug = ?", "");
                sqlx::query(&by_slug_sql)
                    .bind(key)
                    .bind(1i64)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        row.map(row_to_server).transpose()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Server>> {
        // SQLite sorts NULLs first in ASC and last in DESC, which already gives the
        // `updatedAt DESC NULLS LAST` ordering §4.1 asks for without an explicit clause.
        let sql = server_select("", "ORDER BY updated_at DESC, id ASC");
        let rows = sqlx::query(&sql).bind(limit as i64).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_server).collect()
    }

    async fn search_full_text(&self, expression: &str, limit: usize) -> Result<Vec<Server>> {
        let sql = format!(
            r#"
            SELECT s.row_id, s.id, s.slug, s.name, s.description, s.version, s.categories_json,
                   s.keywords_json, s.registry_type, s.package_identifier, s.transport_type,
                   s.has_remote, s.remote_url, s.sources_json, s.raw_data_json, s.last_synced_at,
                   s.repository_url, s.repository_source, s.published_at, s.updated_at, s.status,
                   s.use_count, s.verified, s.icon_url, s.environment_variables_json
            FROM servers_fts
            JOIN servers s ON s.row_id = servers_fts.rowid
            WHERE servers_fts MATCH ?
            ORDER BY bm25(servers_fts), s.updated_at DESC, s.id ASC
            LIMIT ?
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(expression)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .context("full-text search failed")?;
        rows.into_iter().map(row_to_server).collect()
    }

    async fn list_category_counts(&self) -> Result<Vec<(String, u64)>> {
        let rows = sqlx::query("SELECT categories_json FROM servers WHERE status = 'active'")
            .fetch_all(&self.pool)
            .await?;

        let mut counts: std::collections::HashMap<String, u64> = std::collections::HashMap::new();

        for row in rows {
            let categories_json: String = row.get(0);
            let categories: IndexSet<String> = serde_json::from_str(&categories_json)?;
            for cat in categories {
                *counts.entry(cat).or_insert(0) += 1;
            }
        }

        // Only the named taxonomy is reported; `other` is a normalizer fallback, not a
        // taxonomy entry. Sorted by count descending, omitting zero-count categories,
        // ties broken by name so the ordering is deterministic.
        let mut result: Vec<(String, u64)> = crate::category::TAXONOMY
            .iter()
            .filter_map(|c| counts.get(c.name).map(|&n| (c.name.to_string(), n)))
            .filter(|(_, n)| *n > 0)
            .collect();
        result.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(result)
    }

    async fn list_by_category(&self, category: &str, limit: usize) -> Result<Vec<Server>> {
        // The taxonomy is small and categories_json isn't indexed, so filtering happens
        // in Rust after pulling a generously oversized recent-first page.
        let sql = server_select("", "ORDER BY updated_at DESC, id ASC");
        let rows = sqlx::query(&sql)
            .bind((limit * 8).max(50) as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut matched = Vec::with_capacity(limit);
        for row in rows {
            let server = row_to_server(row)?;
            if server.categories.contains(category) {
                matched.push(server);
                if matched.len() == limit {
                    break;
                }
            }
        }
        Ok(matched)
    }

    async fn get_last_sync(&self, source: Source) -> Result<Option<SyncLog>> {
        let row = sqlx::query(
            "SELECT source, last_synced_at, server_count, status, error FROM sync_log WHERE source = ?",
        )
        .bind(source.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_sync_log).transpose()
    }

    async fn update_sync_log(&self, log: &SyncLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_log (source, last_synced_at, server_count, status, error)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(source) DO UPDATE SET
                last_synced_at = excluded.last_synced_at,
                server_count = excluded.server_count,
                status = excluded.status,
                error = excluded.error
            "#,
        )
        .bind(log.source.as_str())
        .bind(log.last_synced_at)
        .bind(log.server_count as i64)
        .bind(log.status.as_str())
        .bind(&log.error)
        .execute(&self.pool)
        .await
        .context("failed to update sync log")?;
        Ok(())
    }

    async fn list_sync_logs(&self) -> Result<Vec<SyncLog>> {
        let rows = sqlx::query(
            "SELECT source, last_synced_at, server_count, status, error FROM sync_log ORDER BY last_synced_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_sync_log).collect()
    }

    async fn purge_stale(&self) -> Result<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(STALE_HORIZON_DAYS);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM servers_fts WHERE rowid IN (SELECT row_id FROM servers WHERE last_synced_at < ?)",
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await
        .context("failed to purge stale fts rows")?;

        let result = sqlx::query("DELETE FROM servers WHERE last_synced_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .context("failed to purge stale servers")?;

        tx.commit().await.context("failed to commit purge transaction")?;
        Ok(result.rows_affected())
    }
}

/// Builds `SELECT <server columns> FROM servers <where> <order> LIMIT ?`. The final bind
/// parameter is always the limit; `where_clause` may bind its own `?`s before it.
fn server_select(where_clause: &str, order_clause: &str) -> String {
    format!(
        r#"
        SELECT row_id, id, slug, name, description, version, categories_json, keywords_json,
               registry_type, package_identifier, transport_type, has_remote, remote_url,
               sources_json, raw_data_json, last_synced_at, repository_url, repository_source,
               published_at, updated_at, status, use_count, verified, icon_url,
               environment_variables_json
        FROM servers
        {where_clause}
        {order_clause}
        LIMIT ?
        "#
    )
}

fn row_to_server(row: sqlx::sqlite::SqliteRow) -> Result<Server> {
    let categories_json: String = row.try_get("categories_json")?;
    let keywords_json: String = row.try_get("keywords_json")?;
    let sources_json: String = row.try_get("sources_json")?;
    let raw_data_json: String = row.try_get("raw_data_json")?;
    let env_vars_json: String = row.try_get("environment_variables_json")?;

    let registry_type: Option<String> = row.try_get("registry_type")?;
    let transport_type: Option<String> = row.try_get("transport_type")?;
    let use_count: i64 = row.try_get("use_count")?;

    Ok(Server {
        id: row.try_get("id")?,
        slug: Slug::from_id(&row.try_get::<String, _>("slug")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        version: row.try_get("version")?,
        categories: serde_json::from_str(&categories_json)?,
        keywords: serde_json::from_str(&keywords_json)?,
        registry_type: registry_type.and_then(|s| RegistryType::parse(&s)),
        package_identifier: row.try_get("package_identifier")?,
        transport_type: transport_type.and_then(|s| TransportType::parse(&s)),
        has_remote: row.try_get("has_remote")?,
        remote_url: row.try_get("remote_url")?,
        sources: serde_json::from_str(&sources_json)?,
        raw_data: serde_json::from_str(&raw_data_json)?,
        last_synced_at: row.try_get::<DateTime<Utc>, _>("last_synced_at")?,
        repository_url: row.try_get("repository_url")?,
        repository_source: row.try_get("repository_source")?,
        published_at: row.try_get("published_at")?,
        updated_at: row.try_get("updated_at")?,
        status: row.try_get("status")?,
        use_count: use_count as u64,
        verified: row.try_get("verified")?,
        icon_url: row.try_get("icon_url")?,
        environment_variables: serde_json::from_str::<Vec<EnvVar>>(&env_vars_json)?,
    })
}

fn row_to_sync_log(row: sqlx::sqlite::SqliteRow) -> Result<SyncLog> {
    let source: String = row.try_get("source")?;
    let status: String = row.try_get("status")?;
    let server_count: i64 = row.try_get("server_count")?;
    Ok(SyncLog {
        source: Source::parse(&source).ok_or_else(|| anyhow::anyhow!("unknown source {source}"))?,
        last_synced_at: row.try_get("last_synced_at")?,
        server_count: server_count as u64,
        status: if status == "ok" { SyncStatus::Ok } else { SyncStatus::Error },
        error: row.try_get("error")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, RawEntry};

    async fn test_store() -> SqliteStore {
        SqliteStore::open(":memory:").await.expect("open in-memory store")
    }

    fn sample_server(id: &str, name: &str) -> Server {
        normalize(
            Source::Official,
            RawEntry {
                id: id.to_string(),
                name: name.to_string(),
                description: "a filesystem access tool".to_string(),
                raw_data: serde_json::json!({}),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn upsert_then_fetch_by_id_and_slug() {
        let store = test_store().await;
        let server = sample_server("io.test/fs", "io.test/fs");
        store.upsert_servers(&[server.clone()]).await.unwrap();

        let by_id = store.get_server_by_id_or_slug("io.test/fs").await.unwrap().unwrap();
        assert_eq!(by_id.id, server.id);

        let by_slug = store
            .get_server_by_id_or_slug(server.slug.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.id, server.id);

        assert!(store.get_server_by_id_or_slug("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_unions_sources_across_syncs() {
        let store = test_store().await;
        let mut from_official = sample_server("io.test/foo", "foo");
        from_official.sources = [Source::Official].into_iter().collect();
        store.upsert_servers(&[from_official]).await.unwrap();

        let mut from_smithery = sample_server("io.test/foo", "foo");
        from_smithery.sources = [Source::Smithery].into_iter().collect();
        from_smithery.use_count = 1234;
        from_smithery.verified = true;
        store.upsert_servers(&[from_smithery]).await.unwrap();

        let fetched = store.get_server_by_id_or_slug("io.test/foo").await.unwrap().unwrap();
        assert_eq!(fetched.sources, [Source::Official, Source::Smithery].into_iter().collect());
        assert_eq!(fetched.use_count, 1234);
        assert!(fetched.verified);
    }

    #[tokio::test]
    async fn upsert_replaces_categories_rather_than_union() {
        let store = test_store().await;
        let mut server = sample_server("io.test/a", "widget");
        server.categories = ["database".to_string()].into_iter().collect();
        store.upsert_servers(&[server.clone()]).await.unwrap();

        server.categories = ["web".to_string()].into_iter().collect();
        store.upsert_servers(&[server.clone()]).await.unwrap();

        let fetched = store.get_server_by_id_or_slug("io.test/a").await.unwrap().unwrap();
        assert_eq!(fetched.categories.len(), 1);
        assert!(fetched.categories.contains("web"));
    }

    #[tokio::test]
    async fn full_text_search_finds_by_keyword() {
        let store = test_store().await;
        store
            .upsert_servers(&[sample_server("io.test/fs", "filesystem server")])
            .await
            .unwrap();

        let results = store.search_full_text("\"filesystem\"", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "io.test/fs");
    }

    #[tokio::test]
    async fn list_category_counts_omits_zero_count_categories() {
        let store = test_store().await;
        store
            .upsert_servers(&[sample_server("io.test/fs", "filesystem server")])
            .await
            .unwrap();

        let counts = store.list_category_counts().await.unwrap();
        assert!(counts.iter().all(|(_, n)| *n > 0));
        assert!(counts.iter().any(|(name, _)| name == "filesystem"));
        assert!(counts.iter().all(|(name, _)| name != "ai"));
    }

    #[tokio::test]
    async fn list_category_counts_excludes_other_and_non_active_servers() {
        let store = test_store().await;

        // No keyword in "widget" / "a standalone gadget" matches any taxonomy entry, so
        // the normalizer falls back to the "other" category.
        let widget = normalize(
            Source::Official,
            RawEntry {
                id: "io.test/widget".to_string(),
                name: "widget".to_string(),
                description: "a standalone gadget".to_string(),
                raw_data: serde_json::json!({}),
                ..Default::default()
            },
        );
        store.upsert_servers(&[widget]).await.unwrap();

        // Matches "filesystem" by keyword, but its status is not active.
        let mut deprecated = sample_server("io.test/old-fs", "old filesystem server");
        deprecated.status = "deprecated".to_string();
        store.upsert_servers(&[deprecated]).await.unwrap();

        let counts = store.list_category_counts().await.unwrap();
        assert!(counts.iter().all(|(name, _)| name != "other"));
        assert!(counts.iter().all(|(name, _)| name != "filesystem"));
    }

    #[tokio::test]
    async fn full_text_search_breaks_ties_by_updated_at_then_id() {
        let store = test_store().await;
        let mut older = sample_server("io.test/fs-older", "filesystem server");
        older.updated_at = Some("2024-01-01T00:00:00Z".parse().unwrap());
        let mut newer = sample_server("io.test/fs-newer", "filesystem server");
        newer.updated_at = Some("2024-06-01T00:00:00Z".parse().unwrap());
        store.upsert_servers(&[older, newer]).await.unwrap();

        let results = store.search_full_text("\"filesystem\"", 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "io.test/fs-newer");
        assert_eq!(results[1].id, "io.test/fs-older");
    }

    #[tokio::test]
    async fn sync_log_roundtrip() {
        let store = test_store().await;
        assert!(store.get_last_sync(Source::Official).await.unwrap().is_none());

        let log = SyncLog {
            source: Source::Official,
            last_synced_at: Utc::now(),
            server_count: 5,
            status: SyncStatus::Ok,
            error: None,
        };
        store.update_sync_log(&log).await.unwrap();

        let fetched = store.get_last_sync(Source::Official).await.unwrap().unwrap();
        assert_eq!(fetched.server_count, 5);
        assert_eq!(store.list_sync_logs().await.unwrap().len(), 1);
    }
}
