// Smithery puller (§6): paginated `servers` list with `pagination.{currentPage,
// totalPages}`; carries `useCount`, `verified`, `iconUrl`, `remote`, `homepage`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contracts::{SourceClient, SourcePage};
use crate::errors::CoreError;
use crate::normalize::{RawEntry, RawRemote};
use crate::types::Source;

const BASE_URL: &str = "https://registry.smithery.ai/servers";
const PAGE_SIZE: u32 = 100;

pub struct SmitheryClient {
    http: reqwest::Client,
    base_url: String,
}

impl SmitheryClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http, base_url: BASE_URL.to_string() }
    }

    #[cfg(test)]
    pub fn with_base_url(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl SourceClient for SmitheryClient {
    fn source(&self) -> Source {
        Source::Smithery
    }

    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        _updated_since: Option<DateTime<Utc>>,
    ) -> Result<SourcePage> {
        let page: u32 = cursor.and_then(|c| c.parse().ok()).unwrap_or(1);

        let mut url = reqwest::Url::parse(&self.base_url).context("invalid smithery base url")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("page", &page.to_string());
            q.append_pair("pageSize", &PAGE_SIZE.to_string());
        }

        let response = self.http.get(url).send().await.map_err(|e| CoreError::SourceUnavailable {
            source: "smithery".to_string(),
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::SourceUnavailable {
                source: "smithery".to_string(),
                status: Some(status.as_u16()),
                message: format!("smithery returned {status}"),
            }
            .into());
        }

        let body: ListResponse = response.json().await.map_err(|e| CoreError::SourceUnavailable {
            source: "smithery".to_string(),
            status: None,
            message: format!("failed to decode smithery response: {e}"),
        })?;

        let next_cursor = body.pagination.as_ref().and_then(|p| {
            if p.current_page < p.total_pages {
                Some((p.current_page + 1).to_string())
            } else {
                None
            }
        });

        let entries = body.servers.into_iter().map(Entry::into_raw_entry).collect();

        Ok(SourcePage { entries, next_cursor })
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    servers: Vec<Entry>,
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    current_page: u32,
    total_pages: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
struct Entry {
    #[serde(rename = "qualifiedName")]
    qualified_name: Option<String>,
    name: Option<String>,
    description: String,
    homepage: Option<String>,
    #[serde(rename = "useCount")]
    use_count: Option<u64>,
    verified: Option<bool>,
    #[serde(rename = "iconUrl")]
    icon_url: Option<String>,
    remote: Option<RemoteEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
struct RemoteEntry {
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

        let remotes = self
            .remote
            .as_ref()
            .map(|r| vec![RawRemote { url: r.url.clone() }])
            .unwrap_or_default();

        RawEntry {
            id: id.clone(),
            name: id,
            description: self.description,
            version: None,
            packages: Vec::new(),
            remotes,
            repository_url: self.homepage,
            repository_source: None,
            published_at: None,
            updated_at: None,
            status: None,
            use_count: self.use_count,
            verified: self.verified,
            icon_url: self.icon_url,
            raw_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_popularity_fields() {
        let entry = Entry {
            qualified_name: Some("io.test/foo".to_string()),
            description: "desc".to_string(),
            use_count: Some(1234),
            verified: Some(true),
            ..Default::default()
        };
        let raw = entry.into_raw_entry();
        assert_eq!(raw.use_count, Some(1234));
        assert_eq!(raw.verified, Some(true));
    }

    #[test]
    fn next_page_cursor_stops_at_total_pages() {
        let pagination = Pagination { current_page: 3, total_pages: 3 };
        assert!(pagination.current_page >= pagination.total_pages);
    }
}
