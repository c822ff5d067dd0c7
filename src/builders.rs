// Fluent builder for constructing `Server` values by hand: defaults mirror what
// `normalize()` would produce, so tests can build a minimal server and override only the
// fields they care about.

use anyhow::{bail, Result};
use chrono::Utc;
use indexmap::IndexSet;

use crate::types::{EnvVar, RegistryType, Server, Slug, Source, TransportType};

pub struct ServerBuilder {
    id: Option<String>,
    name: Option<String>,
    description: String,
    version: Option<String>,
    categories: IndexSet<String>,
    keywords: IndexSet<String>,
    registry_type: Option<RegistryType>,
    package_identifier: Option<String>,
    transport_type: Option<TransportType>,
    has_remote: bool,
    remote_url: Option<String>,
    sources: IndexSet<Source>,
    repository_url: Option<String>,
    repository_source: Option<String>,
    use_count: u64,
    verified: bool,
    icon_url: Option<String>,
    environment_variables: Vec<EnvVar>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            name: None,
            description: String::new(),
            version: None,
            categories: IndexSet::new(),
            keywords: IndexSet::new(),
            registry_type: None,
            package_identifier: None,
            transport_type: None,
            has_remote: false,
            remote_url: None,
            sources: IndexSet::new(),
            repository_url: None,
            repository_source: None,
            use_count: 0,
            verified: false,
            icon_url: None,
            environment_variables: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.categories.insert(category.to_string());
        self
    }

    pub fn keyword(mut self, keyword: &str) -> Self {
        self.keywords.insert(keyword.to_string());
        self
    }

    pub fn npm_package(mut self, identifier: impl Into<String>) -> Self {
        self.registry_type = Some(RegistryType::Npm);
        self.package_identifier = Some(identifier.into());
        self
    }

    pub fn pypi_package(mut self, identifier: impl Into<String>) -> Self {
        self.registry_type = Some(RegistryType::Pypi);
        self.package_identifier = Some(identifier.into());
        self
    }

    pub fn transport(mut self, transport: TransportType) -> Self {
        self.transport_type = Some(transport);
        self
    }

    pub fn remote(mut self, url: impl Into<String>) -> Self {
        self.has_remote = true;
        self.remote_url = Some(url.into());
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.sources.insert(source);
        self
    }

    pub fn repository(mut self, url: impl Into<String>, source: impl Into<String>) -> Self {
        self.repository_url = Some(url.into());
        self.repository_source = Some(source.into());
        self
    }

    pub fn use_count(mut self, count: u64) -> Self {
        self.use_count = count;
        self
    }

    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn icon_url(mut self, url: impl Into<String>) -> Self {
        self.icon_url = Some(url.into());
        self
    }

    pub fn env_var(mut self, var: EnvVar) -> Self {
        self.environment_variables.push(var);
        self
    }

    /// Builds a `Server`, falling back to `{"other"}`/`{Source::Official}` defaults if
    /// categories/sources were never set, mirroring `Normalizer`'s own fallbacks.
    pub fn build(mut self) -> Result<Server> {
        let id = self.id.ok_or_else(|| anyhow::anyhow!("id is required"))?;
        if id.trim().is_empty() {
            bail!("id must not be empty");
        }
        let name = self.name.unwrap_or_else(|| id.clone());

        if self.categories.is_empty() {
            self.categories.insert("other".to_string());
        }
        if self.sources.is_empty() {
            self.sources.insert(Source::Official);
        }

        Ok(Server {
            slug: Slug::from_id(&id),
            id,
            name,
            description: self.description,
            version: self.version,
            categories: self.categories,
            keywords: self.keywords,
            registry_type: self.registry_type,
            package_identifier: self.package_identifier,
            transport_type: self.transport_type,
            has_remote: self.has_remote,
            remote_url: self.remote_url,
            sources: self.sources,
            raw_data: serde_json::Value::Null,
            last_synced_at: Utc::now(),
            repository_url: self.repository_url,
            repository_source: self.repository_source,
            published_at: None,
            updated_at: None,
            status: "active".to_string(),
            use_count: self.use_count,
            verified: self.verified,
            icon_url: self.icon_url,
            environment_variables: self.environment_variables,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_server_gets_other_category_and_official_source() {
        let server = ServerBuilder::new().id("io.test/widget").build().unwrap();
        assert_eq!(server.categories.iter().next().unwrap(), "other");
        assert!(server.sources.contains(&Source::Official));
        assert!(server.check_invariants().is_ok());
    }

    #[test]
    fn missing_id_is_rejected() {
        assert!(ServerBuilder::new().build().is_err());
    }

    #[test]
    fn fluent_chain_builds_a_consistent_server() {
        let server = ServerBuilder::new()
            .id("io.test/github")
            .description("GitHub API access")
            .npm_package("@modelcontextprotocol/server-github")
            .transport(TransportType::Stdio)
            .category("git")
            .keyword("github")
            .source(Source::Official)
            .env_var(EnvVar { name: "GITHUB_TOKEN".to_string(), description: None, format: None, is_secret: true })
            .build()
            .unwrap();

        assert_eq!(server.package_identifier.as_deref(), Some("@modelcontextprotocol/server-github"));
        assert_eq!(server.environment_variables.len(), 1);
        assert!(server.check_invariants().is_ok());
    }
}
