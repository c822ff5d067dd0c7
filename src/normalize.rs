// Normalizer — §4.2. A pure function from a raw per-source entry to a `Server` row: no
// I/O, no clock except `last_synced_at = now()`. Raw shapes are permissive decoders
// (unknown fields ignored, missing optional fields default), per §9's re-architecture
// guidance; `raw_data` keeps the opaque payload for audit.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Deserialize;

use crate::category::matching_categories;
use crate::types::{EnvVar, RegistryType, Server, Slug, Source, TransportType};

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "it", "that", "this", "as", "are", "was", "be", "has", "had", "have", "do",
    "does", "did", "will", "can", "could", "would", "should", "may", "might", "shall", "not",
    "no", "mcp", "server", "tool", "model", "context", "protocol",
];

/// Compute keywords from `name + " " + description` per §4.2 step 5: lowercase, strip
/// non-word/non-space/non-`-`, split on whitespace and `._/-`, drop tokens <= 2 chars or
/// in the stop-word list, dedupe preserving first-seen order.
pub fn derive_keywords(name: &str, description: &str) -> IndexSet<String> {
    let haystack = format!("{} {}", name, description).to_lowercase();
    let cleaned: String = haystack
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '-' || c == '.' || c == '_' || c == '/' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut keywords = IndexSet::new();
    for token in cleaned.split(|c: char| c.is_whitespace() || c == '.' || c == '_' || c == '/' || c == '-') {
        if token.len() > 2 && !STOP_WORDS.contains(&token) {
            keywords.insert(token.to_string());
        }
    }
    keywords
}

/// §4.2 step 6: emit every matching category, or `{"other"}` if none match.
pub fn derive_categories(name: &str, description: &str) -> IndexSet<String> {
    let matches = matching_categories(name, description);
    if matches.is_empty() {
        let mut s = IndexSet::new();
        s.insert("other".to_string());
        s
    } else {
        matches.into_iter().map(|c| c.to_string()).collect()
    }
}

/// A package distribution as reported by any of the three upstreams, after per-source
/// parsing has already mapped field names onto this shape (see `sources::*`).
#[derive(Debug, Clone, Default)]
pub struct RawPackage {
    pub registry_type: Option<RegistryType>,
    pub identifier: Option<String>,
    pub transport_type: Option<TransportType>,
    pub environment_variables: Vec<EnvVar>,
}

/// A remote endpoint as reported by any of the three upstreams.
#[derive(Debug, Clone, Default)]
pub struct RawRemote {
    pub url: Option<String>,
}

/// The source-agnostic shape the Normalizer actually consumes. Each `sources::*` puller
/// is responsible for mapping its upstream's wire format onto this struct; the
/// Normalizer itself never speaks HTTP or upstream-specific JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    #[serde(skip)]
    pub packages: Vec<RawPackage>,
    #[serde(skip)]
    pub remotes: Vec<RawRemote>,
    pub repository_url: Option<String>,
    pub repository_source: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub use_count: Option<u64>,
    pub verified: Option<bool>,
    pub icon_url: Option<String>,
    pub raw_data: serde_json::Value,
}

impl Default for RawEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            version: None,
            packages: Vec::new(),
            remotes: Vec::new(),
            repository_url: None,
            repository_source: None,
            published_at: None,
            updated_at: None,
            status: None,
            use_count: None,
            verified: None,
            icon_url: None,
            raw_data: serde_json::Value::Null,
        }
    }
}

/// `normalize(source, raw) -> Server`. Pure aside from reading the clock for
/// `last_synced_at`; `Store::upsertServers` owns merging into any pre-existing row.
pub fn normalize(source: Source, raw: RawEntry) -> Server {
    let slug = Slug::from_id(&raw.id);
    let keywords = derive_keywords(&raw.name, &raw.description);
    let categories = derive_categories(&raw.name, &raw.description);

    let first_package = raw.packages.first().cloned().unwrap_or_default();
    let first_remote = raw.remotes.first().cloned().unwrap_or_default();
    let has_remote = first_remote.url.is_some();

    let mut sources = IndexSet::new();
    sources.insert(source);

    Server {
        id: raw.id,
        slug,
        name: raw.name,
        description: raw.description,
        version: raw.version,
        categories,
        keywords,
        registry_type: first_package.registry_type,
        package_identifier: first_package.identifier,
        transport_type: first_package.transport_type,
        has_remote,
        remote_url: first_remote.url,
        sources,
        raw_data: raw.raw_data,
        last_synced_at: Utc::now(),
        repository_url: raw.repository_url,
        repository_source: raw.repository_source,
        published_at: raw.published_at,
        updated_at: raw.updated_at,
        status: raw.status.unwrap_or_else(|| "active".to_string()),
        use_count: raw.use_count.unwrap_or(0),
        verified: raw.verified.unwrap_or(false),
        icon_url: raw.icon_url,
        environment_variables: first_package.environment_variables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_entry() -> RawEntry {
        RawEntry {
            id: "io.modelcontextprotocol/filesystem".to_string(),
            name: "io.modelcontextprotocol/filesystem".to_string(),
            description: "Secure filesystem access for MCP".to_string(),
            packages: vec![RawPackage {
                registry_type: Some(RegistryType::Npm),
                identifier: Some("@modelcontextprotocol/server-filesystem".to_string()),
                transport_type: Some(TransportType::Stdio),
                environment_variables: vec![],
            }],
            raw_data: serde_json::json!({"name": "io.modelcontextprotocol/filesystem"}),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_s1_scenario() {
        let server = normalize(Source::Official, base_entry());
        assert_eq!(server.slug.as_str(), "io-modelcontextprotocol-filesystem");
        assert_eq!(
            server.package_identifier.as_deref(),
            Some("@modelcontextprotocol/server-filesystem")
        );
        assert!(!server.has_remote);
        assert_eq!(server.sources.iter().next(), Some(&Source::Official));
        assert!(server.keywords.contains("secure"));
        assert!(server.keywords.contains("filesystem"));
        assert!(!server.keywords.contains("mcp")); // stop word
    }

    #[test]
    fn no_package_or_remote_has_empty_strategy_inputs() {
        let mut entry = base_entry();
        entry.packages.clear();
        let server = normalize(Source::Official, entry);
        assert!(server.package_identifier.is_none());
        assert!(!server.has_remote);
    }

    #[test]
    fn no_category_match_falls_back_to_other() {
        let mut entry = base_entry();
        entry.name = "Widget".to_string();
        entry.description = "does something entirely unrelated to any keyword".to_string();
        let server = normalize(Source::Official, entry);
        assert_eq!(server.categories.len(), 1);
        assert!(server.categories.contains("other"));
    }

    #[test]
    fn keywords_have_no_duplicates_and_preserve_order() {
        let mut entry = base_entry();
        entry.name = "filesystem filesystem access".to_string();
        entry.description = String::new();
        let server = normalize(Source::Official, entry);
        let kws: Vec<_> = server.keywords.iter().collect();
        assert_eq!(kws, vec!["filesystem", "access"]);
    }
}
