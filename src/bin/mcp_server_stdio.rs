//! MCPfinder MCP Server - STDIO Version
//!
//! Speaks line-delimited JSON-RPC over stdin/stdout. stdout carries only response
//! frames; all logging goes to stderr via `init_logging_with_level`.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use mcpfinder::config::Config;
use mcpfinder::mcp::{MCPConfig, MCPServer};
use mcpfinder::{init_logging_with_level, sources, CoreFacade, SqliteStore, SyncEngine, SyncGate};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging_with_level(false, true)?;

    let config = Config::from_env()?;
    if let Some(parent) = config.db_path().parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store: Arc<dyn mcpfinder::Store> =
        Arc::new(SqliteStore::open(&config.db_path().to_string_lossy()).await?);

    let http = sources::build_http_client()?;
    let engine = SyncEngine::new(
        Arc::new(sources::OfficialRegistryClient::new(http.clone())),
        Arc::new(sources::GlamaClient::new(http.clone())),
        Arc::new(sources::SmitheryClient::new(http)),
    );
    let gate = SyncGate::with_default_max_age(store.clone(), engine);
    let facade = Arc::new(CoreFacade::new(store, gate));

    let mut mcp_config = MCPConfig::load()?;
    mcp_config.data_dir = config.data_dir.to_string_lossy().to_string();
    let server = MCPServer::new(mcp_config, facade);

    run_stdio_server(server).await
}

async fn run_stdio_server(server: MCPServer) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed JSON-RPC line");
                continue;
            }
        };

        let response = server.handle_request(request).await;
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }

    Ok(())
}
