// Data model — Stage 2: typed records
// Strongly-typed wrappers enforce the invariants from the data model section of the
// spec at construction time rather than scattering `if` checks through call sites.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The upstream catalogs we aggregate. New sources are added here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Official,
    Glama,
    Smithery,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Official => "official",
            Source::Glama => "glama",
            Source::Smithery => "smithery",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "official" => Some(Source::Official),
            "glama" => Some(Source::Glama),
            "smithery" => Some(Source::Smithery),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a server's package is distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryType {
    Npm,
    Pypi,
    Oci,
    Nuget,
    Mcpb,
}

impl RegistryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryType::Npm => "npm",
            RegistryType::Pypi => "pypi",
            RegistryType::Oci => "oci",
            RegistryType::Nuget => "nuget",
            RegistryType::Mcpb => "mcpb",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "npm" => Some(RegistryType::Npm),
            "pypi" => Some(RegistryType::Pypi),
            "oci" => Some(RegistryType::Oci),
            "nuget" => Some(RegistryType::Nuget),
            "mcpb" => Some(RegistryType::Mcpb),
            _ => None,
        }
    }
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a server is reached at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportType {
    Stdio,
    StreamableHttp,
    Sse,
}

impl TransportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Stdio => "stdio",
            TransportType::StreamableHttp => "streamable-http",
            TransportType::Sse => "sse",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stdio" => Some(TransportType::Stdio),
            "streamable-http" => Some(TransportType::StreamableHttp),
            "sse" => Some(TransportType::Sse),
            _ => None,
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A slug is a deterministic, URL-safe function of `id`. Constructing one always
/// succeeds — `slugify` never fails — but the type still exists so callers can't
/// accidentally pass a raw, un-normalized string where a slug is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn from_id(id: &str) -> Self {
        Slug(slugify(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase `id`, collapse runs of non-alphanumerics to a single `-`, trim leading and
/// trailing `-`. Idempotent: `slugify(&slugify(s)) == slugify(s)` for all `s`.
pub fn slugify(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut last_was_dash = false;
    for c in id.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

/// One environment variable a server's package expects to be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub is_secret: bool,
}

/// The unified record for one MCP server version (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub slug: Slug,
    pub name: String,

    pub description: String,
    pub version: Option<String>,
    pub categories: IndexSet<String>,
    pub keywords: IndexSet<String>,

    pub registry_type: Option<RegistryType>,
    pub package_identifier: Option<String>,
    pub transport_type: Option<TransportType>,

    pub has_remote: bool,
    pub remote_url: Option<String>,

    pub sources: IndexSet<Source>,
    pub raw_data: serde_json::Value,
    pub last_synced_at: DateTime<Utc>,

    pub repository_url: Option<String>,
    pub repository_source: Option<String>,

    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub status: String,

    pub use_count: u64,
    pub verified: bool,
    pub icon_url: Option<String>,

    pub environment_variables: Vec<EnvVar>,
}

impl Server {
    /// Structural checks run before every store write: non-empty sources, a well-formed
    /// remote URL whenever `has_remote` is set, categories drawn from the closed taxonomy
    /// (or exactly `{"other"}`), and lowercase keywords longer than two characters.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.sources.is_empty() {
            return Err("sources must be non-empty".into());
        }
        if self.has_remote {
            let url = self
                .remote_url
                .as_deref()
                .ok_or_else(|| "has_remote=true but remote_url is null".to_string())?;
            url::Url::parse(url).map_err(|e| format!("remote_url is not a URL: {e}"))?;
        }
        let is_other_only = self.categories.len() == 1 && self.categories.contains("other");
        if !is_other_only
            && !self
                .categories
                .iter()
                .all(|c| TAXONOMY_NAMES.contains(&c.as_str()))
        {
            return Err(
                "categories must be a subset of the closed taxonomy, or exactly {\"other\"}"
                    .into(),
            );
        }
        for kw in &self.keywords {
            if kw.len() <= 2 || kw.chars().any(|c| c.is_uppercase()) {
                return Err(format!("keyword '{kw}' is not a valid derived keyword"));
            }
        }
        Ok(())
    }
}

/// Names of the closed taxonomy (§4.5), used only for the category check above; the full
/// keyword lists live in `category.rs`.
pub const TAXONOMY_NAMES: &[&str] = &[
    "filesystem",
    "database",
    "api",
    "ai",
    "web",
    "git",
    "cloud",
    "search",
    "monitoring",
    "security",
    "communication",
    "productivity",
    "dev-tools",
    "data",
    "media",
    "other",
];

/// One row per source (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLog {
    pub source: Source,
    pub last_synced_at: DateTime<Utc>,
    pub server_count: u64,
    pub status: SyncStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Ok,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Ok => "ok",
            SyncStatus::Error => "error",
        }
    }
}

/// A client application that can install an MCP server (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Client {
    ClaudeDesktop,
    Cursor,
    ClaudeCode,
    ClineVscode,
    Windsurf,
    Generic,
}

impl Client {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "claude-desktop" => Some(Client::ClaudeDesktop),
            "cursor" => Some(Client::Cursor),
            "claude-code" => Some(Client::ClaudeCode),
            "cline-vscode" => Some(Client::ClineVscode),
            "windsurf" => Some(Client::Windsurf),
            "generic" => Some(Client::Generic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Client::ClaudeDesktop => "claude-desktop",
            Client::Cursor => "cursor",
            Client::ClaudeCode => "claude-code",
            Client::ClineVscode => "cline-vscode",
            Client::Windsurf => "windsurf",
            Client::Generic => "generic",
        }
    }

    pub const ALL: [Client; 6] = [
        Client::ClaudeDesktop,
        Client::Cursor,
        Client::ClaudeCode,
        Client::ClineVscode,
        Client::Windsurf,
        Client::Generic,
    ];
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_deterministic_and_idempotent() {
        let a = slugify("io.modelcontextprotocol/filesystem");
        let b = slugify(&a);
        assert_eq!(a, b);
        assert_eq!(a, "io-modelcontextprotocol-filesystem");
    }

    #[test]
    fn slug_collapses_and_trims() {
        assert_eq!(slugify("  @Org/Pkg!! "), "org-pkg");
        assert_eq!(slugify("___"), "");
    }

    #[test]
    fn same_id_always_yields_same_slug() {
        let id = "Foo_Bar/Baz";
        assert_eq!(Slug::from_id(id), Slug::from_id(id));
    }
}
