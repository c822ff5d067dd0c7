// Glama puller: paginated `servers` list with `pageInfo.{endCursor, hasNextPage}`.
// Entry field names mirror the Official Registry entry shape (the upstream is itself an
// MCP registry aggregator), with a `qualifiedName`/`name` fallback for the id.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contracts::{SourceClient, SourcePage};
use crate::errors::CoreError;
use crate::normalize::{RawEntry, RawPackage, RawRemote};
use crate::types::{RegistryType, Source, TransportType};

const BASE_URL: &str = "https://glama.ai/api/mcp/v1/servers";
const PAGE_SIZE: u32 = 100;

pub struct GlamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl GlamaClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http, base_url: BASE_URL.to_string() }
    }

    #[cfg(test)]
    pub fn with_base_url(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl SourceClient for GlamaClient {
    fn source(&self) -> Source {
        Source::Glama
    }

    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        _updated_since: Option<DateTime<Utc>>,
    ) -> Result<SourcePage> {
        let mut url = reqwest::Url::parse(&self.base_url).context("invalid glama base url")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("first", &PAGE_SIZE.to_string());
            if let Some(c) = cursor {
                q.append_pair("after", c);
            }
        }

        let response = self.http.get(url).send().await.map_err(|e| CoreError::SourceUnavailable {
            source: "glama".to_string(),
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::SourceUnavailable {
                source: "glama".to_string(),
                status: Some(status.as_u16()),
                message: format!("glama returned {status}"),
            }
            .into());
        }

        let body: ListResponse = response.json().await.map_err(|e| CoreError::SourceUnavailable {
            source: "glama".to_string(),
            status: None,
            message: format!("failed to decode glama response: {e}"),
        })?;

        let next_cursor = body
            .page_info
            .as_ref()
            .filter(|p| p.has_next_page)
            .and_then(|p| p.end_cursor.clone());

        let entries = body.servers.into_iter().map(Entry::into_raw_entry).collect();

        Ok(SourcePage { entries, next_cursor })
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    servers: Vec<Entry>,
    #[serde(rename = "pageInfo")]
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
struct Entry {
    #[serde(rename = "qualifiedName")]
    qualified_name: Option<String>,
    name: Option<String>,
    description: String,
    #[serde(rename = "repositoryUrl")]
    repository_url: Option<String>,
    packages: Vec<Package>,
    remotes: Vec<Remote>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Package {
    registry_type: Option<String>,
    identifier: Option<String>,
    transport_type: Option<String>,
    #[serde(default)]
    environment_variables: Vec<EnvironmentVariable>,
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

impl Entry {
    fn into_raw_entry(self) -> RawEntry {
        let id = self
            .qualified_name
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_default();
        let raw_data = serde_json::to_value(&self).unwrap_or(serde_json::Value::Null);

        let packages = self
            .packages
            .iter()
            .map(|p| RawPackage {
                registry_type: p.registry_type.as_deref().and_then(RegistryType::parse),
                identifier: p.identifier.clone(),
                transport_type: p.transport_type.as_deref().and_then(TransportType::parse),
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

        let remotes = self.remotes.iter().map(|r| RawRemote { url: r.url.clone() }).collect();

        RawEntry {
            id: id.clone(),
            name: id,
            description: self.description,
            version: None,
            packages,
            remotes,
            repository_url: self.repository_url,
            repository_source: None,
            published_at: None,
            updated_at: None,
            status: None,
            use_count: None,
            verified: None,
            icon_url: None,
            raw_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_wins_over_name() {
        let entry = Entry {
            qualified_name: Some("org/pkg".to_string()),
            name: Some("pkg".to_string()),
            description: "desc".to_string(),
            ..Default::default()
        };
        assert_eq!(entry.into_raw_entry().id, "org/pkg");
    }

    #[test]
    fn falls_back_to_name_when_no_qualified_name() {
        let entry = Entry { name: Some("pkg".to_string()), description: "desc".to_string(), ..Default::default() };
        assert_eq!(entry.into_raw_entry().id, "pkg");
    }
}
