// Official MCP Registry puller: decodes the registry's paginated JSON into
// `normalize::RawEntry` and implements `contracts::SourceClient`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::contracts::{SourceClient, SourcePage};
use crate::errors::CoreError;
use crate::normalize::{RawEntry, RawPackage, RawRemote};
use crate::types::{RegistryType, Source, TransportType};

const BASE_URL: &str = "https://registry.modelcontextprotocol.io/v0.1/servers";
const PAGE_SIZE: u32 = 100;

pub struct OfficialRegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl OfficialRegistryClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http, base_url: BASE_URL.to_string() }
    }

    #[cfg(test)]
    pub fn with_base_url(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl SourceClient for OfficialRegistryClient {
    fn source(&self) -> Source {
        Source::Official
    }

    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        updated_since: Option<DateTime<Utc>>,
    ) -> Result<SourcePage> {
        let mut url = reqwest::Url::parse(&self.base_url).context("invalid official registry base url")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("version", "latest");
            q.append_pair("limit", &PAGE_SIZE.to_string());
            if let Some(c) = cursor {
                q.append_pair("cursor", c);
            }
            if let Some(ts) = updated_since {
                q.append_pair("updated_since", &ts.to_rfc3339());
            }
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::SourceUnavailable {
                source: "official".to_string(),
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::SourceUnavailable {
                source: "official".to_string(),
                status: Some(status.as_u16()),
                message: format!("official registry returned {status}"),
            }
            .into());
        }

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| CoreError::SourceUnavailable {
                source: "official".to_string(),
                status: None,
                message: format!("failed to decode official registry response: {e}"),
            })?;

        let entries = body.servers.into_iter().filter_map(|w| w.into_raw_entry().ok()).collect();

        Ok(SourcePage { entries, next_cursor: body.metadata.and_then(|m| m.next_cursor) })
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    servers: Vec<ServerWrapper>,
    metadata: Option<ListMetadata>,
}

#[derive(Debug, Deserialize)]
struct ListMetadata {
    #[serde(rename = "nextCursor")]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ServerWrapper {
    server: ServerEntry,
    #[serde(rename = "_meta", default)]
    meta: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
struct ServerEntry {
    name: String,
    description: String,
    version: Option<String>,
    repository: Option<Repository>,
    packages: Vec<Package>,
    remotes: Vec<Remote>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
struct Repository {
    url: Option<String>,
    source: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Package {
    registry_type: Option<String>,
    identifier: Option<String>,
    transport: Option<Transport>,
    environment_variables: Vec<EnvironmentVariable>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
struct Transport {
    #[serde(rename = "type")]
    transport_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct EnvironmentVariable {
    name: String,
    description: Option<String>,
    format: Option<String>,
    is_secret: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
struct Remote {
    url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct OfficialMeta {
    status: Option<String>,
    published_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl ServerWrapper {
    fn into_raw_entry(self) -> Result<RawEntry> {
        let official_meta: OfficialMeta = self
            .meta
            .iter()
            .find(|(k, _)| k.contains("modelcontextprotocol"))
            .and_then(|(_, v)| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let raw_data = serde_json::to_value(&self).unwrap_or(serde_json::Value::Null);

        let packages = self
            .server
            .packages
            .iter()
            .map(|p| RawPackage {
                registry_type: p.registry_type.as_deref().and_then(RegistryType::parse),
                identifier: p.identifier.clone(),
                transport_type: p
                    .transport
                    .as_ref()
                    .and_then(|t| t.transport_type.as_deref())
                    .and_then(TransportType::parse),
                environment_variables: p
                    .environment_variables
                    .iter()
                    .map(|e| crate::types::EnvVar {
                        name: e.name.clone(),
                        description: e.description.clone(),
                        format: e.format.clone(),
                        is_secret: e.is_secret,
                    })
                    .collect(),
            })
            .collect();

        let remotes = self.server.remotes.iter().map(|r| RawRemote { url: r.url.clone() }).collect();

        Ok(RawEntry {
            id: self.server.name.clone(),
            name: self.server.name,
            description: self.server.description,
            version: self.server.version,
            packages,
            remotes,
            repository_url: self.server.repository.as_ref().and_then(|r| r.url.clone()),
            repository_source: self.server.repository.as_ref().and_then(|r| r.source.clone()),
            published_at: official_meta.published_at,
            updated_at: official_meta.updated_at,
            status: official_meta.status,
            use_count: None,
            verified: None,
            icon_url: None,
            raw_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_entry() {
        let json = serde_json::json!({
            "servers": [{
                "server": {
                    "name": "io.modelcontextprotocol/filesystem",
                    "description": "Secure filesystem access",
                    "version": "1.0.0",
                    "repository": {"url": "https://github.com/modelcontextprotocol/servers", "source": "github"},
                    "packages": [{
                        "registryType": "npm",
                        "identifier": "@modelcontextprotocol/server-filesystem",
                        "transport": {"type": "stdio"},
                        "environmentVariables": []
                    }],
                    "remotes": []
                },
                "_meta": {
                    "io.modelcontextprotocol.registry/official": {
                        "status": "active",
                        "publishedAt": "2024-05-01T00:00:00Z",
                        "updatedAt": "2024-05-01T00:00:00Z"
                    }
                }
            }],
            "metadata": {"nextCursor": null}
        });

        let response: ListResponse = serde_json::from_value(json).unwrap();
        let entry = response.servers.into_iter().next().unwrap().into_raw_entry().unwrap();

        assert_eq!(entry.id, "io.modelcontextprotocol/filesystem");
        assert_eq!(entry.packages[0].identifier.as_deref(), Some("@modelcontextprotocol/server-filesystem"));
        assert_eq!(entry.status.as_deref(), Some("active"));
    }
}
