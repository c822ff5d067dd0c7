// MCP JSON-RPC envelope types (`MCPRequest`/`MCPResponse`/`RequestId`/`MCPError`) plus the
// request/response payloads for the five Core Facade operations this crate exposes.

use serde::{Deserialize, Serialize};

use crate::install::InstallPayload;
use crate::search::{SearchResult, ServerDetail};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl MCPError {
    pub fn parse_error(message: &str) -> Self {
        Self { code: error_codes::PARSE_ERROR, message: message.to_string(), data: None }
    }

    pub fn invalid_request(message: &str) -> Self {
        Self { code: error_codes::INVALID_REQUEST, message: message.to_string(), data: None }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: error_codes::METHOD_NOT_FOUND,
            message: format!("Method '{method}' not found"),
            data: None,
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self { code: error_codes::INVALID_PARAMS, message: message.to_string(), data: None }
    }

    pub fn internal_error(message: &str) -> Self {
        Self { code: error_codes::INTERNAL_ERROR, message: message.to_string(), data: None }
    }
}

/// `search_servers` tool request/response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchServersRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub transport_type: Option<String>,
    #[serde(default)]
    pub registry_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchServersResponse {
    pub results: Vec<SearchResult>,
}

/// `get_server_details` tool request/response.
#[derive(Debug, Clone, Deserialize)]
pub struct GetServerDetailsRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetServerDetailsResponse {
    pub server: Option<ServerDetail>,
}

/// `get_install_command` tool request/response.
#[derive(Debug, Clone, Deserialize)]
pub struct GetInstallCommandRequest {
    pub key: String,
    pub client: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetInstallCommandResponse {
    pub install: Option<InstallPayload>,
}

/// `list_categories` tool response (no request fields).
#[derive(Debug, Clone, Serialize)]
pub struct ListCategoriesResponse {
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: u64,
}

/// `browse_category` tool request/response.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowseCategoryRequest {
    pub category: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowseCategoryResponse {
    pub results: Vec<SearchResult>,
}
