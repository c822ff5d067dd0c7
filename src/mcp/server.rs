use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use crate::facade::CoreFacade;
use crate::mcp::config::MCPConfig;
use crate::mcp::types::*;
use crate::search::SearchFilters;
use crate::types::{Client, RegistryType, Source, TransportType};

/// Thin JSON-RPC adapter over the Core Facade. Holds no state of its own beyond the
/// facade handle and the identity it reports in `initialize`/`capabilities`.
pub struct MCPServer {
    config: MCPConfig,
    facade: Arc<CoreFacade>,
}

impl MCPServer {
    pub fn new(config: MCPConfig, facade: Arc<CoreFacade>) -> Self {
        Self { config, facade }
    }

    /// Dispatches one JSON-RPC request, never panicking: any failure becomes an
    /// `MCPError` inside a normal `MCPResponse`.
    pub async fn handle_request(&self, request: MCPRequest) -> MCPResponse {
        let id = request.id.clone();
        match self.dispatch(&request.method, request.params).await {
            Ok(result) => MCPResponse { jsonrpc: "2.0".to_string(), id, result: Some(result), error: None },
            Err(error) => MCPResponse { jsonrpc: "2.0".to_string(), id, result: None, error: Some(error) },
        }
    }

    async fn dispatch(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, MCPError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": self.config.protocol_version,
                "serverInfo": {
                    "name": self.config.server_name,
                    "version": self.config.server_version,
                },
                "capabilities": { "tools": {} },
            })),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.call_tool(params).await,
            "ping" => Ok(json!({ "status": "ok" })),
            other => Err(MCPError::method_not_found(other)),
        }
    }

    async fn call_tool(&self, params: serde_json::Value) -> Result<serde_json::Value, MCPError> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MCPError::invalid_params("missing 'name'"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(serde_json::Value::Null);

        let payload = match name {
            "search_servers" => self.search_servers(arguments).await?,
            "get_server_details" => self.get_server_details(arguments).await?,
            "get_install_command" => self.get_install_command(arguments).await?,
            "list_categories" => self.list_categories().await?,
            "browse_category" => self.browse_category(arguments).await?,
            other => return Err(MCPError::method_not_found(other)),
        };

        Ok(json!({
            "content": [{
                "type": "text",
                "text": serde_json::to_string_pretty(&payload).unwrap_or_default(),
            }]
        }))
    }

    async fn search_servers(&self, arguments: serde_json::Value) -> Result<serde_json::Value, MCPError> {
        let req: SearchServersRequest = serde_json::from_value(arguments)
            .map_err(|e| MCPError::invalid_params(&e.to_string()))?;
        let filters = SearchFilters {
            transport_type: req.transport_type.as_deref().and_then(TransportType::parse),
            registry_type: req.registry_type.as_deref().and_then(RegistryType::parse),
            source: req.source.as_deref().and_then(Source::parse),
        };
        let results = self
            .facade
            .search_servers(&req.query, req.limit.unwrap_or(10), filters)
            .await
            .map_err(|e| MCPError::internal_error(&e.to_string()))?;
        Ok(serde_json::to_value(SearchServersResponse { results }).unwrap())
    }

    async fn get_server_details(&self, arguments: serde_json::Value) -> Result<serde_json::Value, MCPError> {
        let req: GetServerDetailsRequest = serde_json::from_value(arguments)
            .map_err(|e| MCPError::invalid_params(&e.to_string()))?;
        let server = self
            .facade
            .get_server_details(&req.key)
            .await
            .map_err(|e| MCPError::internal_error(&e.to_string()))?;
        Ok(serde_json::to_value(GetServerDetailsResponse { server }).unwrap())
    }

    async fn get_install_command(&self, arguments: serde_json::Value) -> Result<serde_json::Value, MCPError> {
        let req: GetInstallCommandRequest = serde_json::from_value(arguments)
            .map_err(|e| MCPError::invalid_params(&e.to_string()))?;
        let client = Client::parse(&req.client)
            .ok_or_else(|| MCPError::invalid_params(&format!("unknown client '{}'", req.client)))?;
        let install = self
            .facade
            .get_install_command(&req.key, client)
            .await
            .map_err(|e| MCPError::internal_error(&e.to_string()))?;
        Ok(serde_json::to_value(GetInstallCommandResponse { install }).unwrap())
    }

    async fn list_categories(&self) -> Result<serde_json::Value, MCPError> {
        let counts = self.facade.list_categories().await.map_err(|e| MCPError::internal_error(&e.to_string()))?;
        let categories = counts.into_iter().map(|(name, count)| CategoryCount { name, count }).collect();
        Ok(serde_json::to_value(ListCategoriesResponse { categories }).unwrap())
    }

    async fn browse_category(&self, arguments: serde_json::Value) -> Result<serde_json::Value, MCPError> {
        let req: BrowseCategoryRequest = serde_json::from_value(arguments)
            .map_err(|e| MCPError::invalid_params(&e.to_string()))?;
        let results = self
            .facade
            .browse_category(&req.category, req.limit.unwrap_or(20))
            .await
            .map_err(|e| MCPError::internal_error(&e.to_string()))?;
        Ok(serde_json::to_value(BrowseCategoryResponse { results }).unwrap())
    }
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "search_servers".to_string(),
            description: "Search the MCP server registry by keyword".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 50},
                    "transport_type": {"type": "string", "enum": ["stdio", "streamable-http", "sse"]},
                    "registry_type": {"type": "string", "enum": ["npm", "pypi", "oci", "nuget", "mcpb"]},
                    "source": {"type": "string", "enum": ["official", "glama", "smithery"]},
                },
                "required": ["query"],
            }),
        },
        ToolDefinition {
            name: "get_server_details".to_string(),
            description: "Fetch the full record for one server by id, slug, or name".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "key": {"type": "string"} },
                "required": ["key"],
            }),
        },
        ToolDefinition {
            name: "get_install_command".to_string(),
            description: "Generate an install config snippet for a server and client".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string"},
                    "client": {
                        "type": "string",
                        "enum": ["claude-desktop", "cursor", "claude-code", "cline-vscode", "windsurf", "generic"],
                    },
                },
                "required": ["key", "client"],
            }),
        },
        ToolDefinition {
            name: "list_categories".to_string(),
            description: "List server categories with counts".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolDefinition {
            name: "browse_category".to_string(),
            description: "List servers tagged with a category".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {"type": "string"},
                    "limit": {"type": "integer", "minimum": 1},
                },
                "required": ["category"],
            }),
        },
    ]
}
