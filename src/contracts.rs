// Contract-first design: the traits other modules code against live in one place,
// documented with preconditions/postconditions, separate from any one implementation.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::normalize::RawEntry;
use crate::types::{Server, Source, SyncLog};

/// One page of raw entries from an upstream source, plus whatever cursor gets the next
/// page. `cursor = None` means this was the last page.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub entries: Vec<RawEntry>,
    pub next_cursor: Option<String>,
}

/// Abstracts one upstream registry's paginated HTTP API (§6) so the Sync Engine can be
/// tested against a fake implementation instead of a live network call.
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn source(&self) -> Source;

    /// Fetch one page, starting from `cursor` (`None` for the first page) and, when the
    /// source supports it, only entries updated after `updated_since`.
    ///
    /// # Preconditions
    /// - `cursor`, if `Some`, was returned by a previous call to this same method.
    ///
    /// # Postconditions
    /// - Returns a `SourcePage` with zero or more entries.
    /// - Never retries internally; the caller (Sync Engine) owns retry/backoff policy.
    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        updated_since: Option<DateTime<Utc>>,
    ) -> Result<SourcePage>;
}

/// The embedded store's contract (§4.1). Implementations must be safe to call from
/// multiple tokio tasks concurrently; `SyncGate` additionally serializes writers at a
/// higher level so this trait doesn't need to.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open (creating if absent) the store at `path`.
    ///
    /// # Postconditions
    /// - Schema is migrated to the current version.
    /// - WAL mode is enabled; the returned handle is safe to share across tasks.
    async fn open(path: &str) -> Result<Self>
    where
        Self: Sized;

    /// Insert or update `servers`, keyed by `id`, within one transaction.
    ///
    /// # Postconditions
    /// - A row whose `id` already exists has every descriptive and package field
    ///   overwritten by the incoming value (last write wins per-source), except
    ///   `sources`, which is unioned with the row's existing sources rather than
    ///   replaced — once a source has seen an id, that attribution is never lost.
    /// - The full-text index reflects the new `name`/`description`/`keywords` before this
    ///   call returns.
    /// - Either all of `servers` are committed, or none are (atomic per call).
    async fn upsert_servers(&self, servers: &[Server]) -> Result<()>;

    /// Look up one server by `id`, falling back to slug if no id matches.
    ///
    /// # Postconditions
    /// - Returns `Ok(None)` if neither an id nor a slug match; never an error for "not
    ///   found".
    async fn get_server_by_id_or_slug(&self, key: &str) -> Result<Option<Server>>;

    /// The `limit` most recently updated servers (by `updatedAt`, nulls sorted last), ties
    /// broken by `id` ascending.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Server>>;

    /// Full-text search against `expression` (already sanitized by the Search Engine),
    /// ranked by FTS5 relevance, ties broken by `id` ascending.
    async fn search_full_text(&self, expression: &str, limit: usize) -> Result<Vec<Server>>;

    /// Count of active servers per taxonomy category, sorted by count descending then
    /// name ascending, omitting categories with zero servers. Non-active servers are
    /// excluded, and `other` (the normalizer's no-match fallback) is never reported since
    /// it isn't a taxonomy entry.
    async fn list_category_counts(&self) -> Result<Vec<(String, u64)>>;

    /// Servers tagged with `category`, most recently updated first, ties broken by `id`.
    async fn list_by_category(&self, category: &str, limit: usize) -> Result<Vec<Server>>;

    /// The most recent `SyncLog` row for `source`, or `None` if never synced.
    async fn get_last_sync(&self, source: Source) -> Result<Option<SyncLog>>;

    /// Replace the `SyncLog` row for `log.source` with `log`.
    async fn update_sync_log(&self, log: &SyncLog) -> Result<()>;

    /// All `SyncLog` rows, most recent first (supplemented op, `mcpfinder sync --status`).
    async fn list_sync_logs(&self) -> Result<Vec<SyncLog>>;

    /// Delete servers not seen by any sync in over 30 days (supplemented maintenance op,
    /// exposed as `mcpfinder sync --prune`).
    ///
    /// # Postconditions
    /// - Returns the number of rows deleted.
    async fn purge_stale(&self) -> Result<u64>;
}
