// MCPfinder CLI - local discovery service for the MCP server ecosystem
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

// Macro for conditional printing based on quiet flag
macro_rules! qprintln {
    ($quiet:expr, $($arg:tt)*) => {
        if !$quiet {
            println!($($arg)*);
        }
    };
}

use mcpfinder::{
    init_logging_with_level, sources, CoreFacade, SearchFilters, SqliteStore, Store, SyncEngine,
    SyncGate,
};
use mcpfinder::types::{Client, RegistryType, Source, TransportType};
use mcpfinder::config::Config;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "MCPfinder - local discovery service for the MCP server ecosystem",
    long_about = None,
    after_help = "QUICK START:
  1. Search the registry:      mcpfinder search filesystem
  2. Inspect one server:       mcpfinder details io.modelcontextprotocol/filesystem
  3. Generate an install:      mcpfinder install io.modelcontextprotocol/filesystem cursor
  4. Browse by category:       mcpfinder browse databases

EXAMPLES:
  mcpfinder search 'postgres' --limit 5
  mcpfinder details postgres-mcp
  mcpfinder install postgres-mcp claude-desktop
  mcpfinder categories
  mcpfinder sync --status"
)]
struct Cli {
    /// Enable verbose logging (DEBUG level). Default is INFO level.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all non-essential output for LLM-friendly results (ERROR level logging only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the MCP server registry by keyword
    Search {
        /// Search query (empty string returns the most recently updated servers)
        query: String,
        /// Maximum number of results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Filter by transport type (stdio, streamable-http, sse)
        #[arg(long)]
        transport: Option<String>,
        /// Filter by package registry (npm, pypi, oci, nuget, mcpb)
        #[arg(long)]
        registry: Option<String>,
        /// Filter by upstream source (official, glama, smithery)
        #[arg(long)]
        source: Option<String>,
    },

    /// Fetch the full record for one server by id, slug, or name
    Details {
        /// Server id, slug, or trailing name segment
        key: String,
    },

    /// Generate an install config snippet for a server and client
    Install {
        /// Server id, slug, or trailing name segment
        key: String,
        /// Target client (claude-desktop, cursor, claude-code, cline-vscode, windsurf, generic)
        client: String,
    },

    /// List server categories with counts
    Categories,

    /// List servers tagged with a category
    Browse {
        /// Taxonomy category name
        category: String,
        /// Maximum number of results to return
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List the clients an install config can be generated for
    Clients,

    /// Pull fresh data from the upstream registries
    Sync {
        /// Print each source's last sync log instead of running a sync
        #[arg(long)]
        status: bool,
        /// Delete servers not seen by any sync in over 30 days
        #[arg(long)]
        prune: bool,
    },
}

async fn build_facade(config: &Config) -> Result<CoreFacade> {
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
    Ok(CoreFacade::new(store, gate))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging_with_level(cli.verbose, cli.quiet)?;
    let quiet = cli.quiet;

    let config = Config::from_env()?;

    match cli.command {
        Commands::Search { query, limit, transport, registry, source } => {
            let facade = build_facade(&config).await?;
            let filters = SearchFilters {
                transport_type: transport.as_deref().and_then(TransportType::parse),
                registry_type: registry.as_deref().and_then(RegistryType::parse),
                source: source.as_deref().and_then(Source::parse),
            };
            let results = facade.search_servers(&query, limit, filters).await?;
            if results.is_empty() {
                qprintln!(quiet, "No servers matched '{}'.", query);
            } else {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }

        Commands::Details { key } => {
            let facade = build_facade(&config).await?;
            match facade.get_server_details(&key).await? {
                Some(detail) => println!("{}", serde_json::to_string_pretty(&detail)?),
                None => qprintln!(quiet, "No server found for '{}'.", key),
            }
        }

        Commands::Install { key, client } => {
            let facade = build_facade(&config).await?;
            let client = Client::parse(&client)
                .ok_or_else(|| anyhow::anyhow!("unknown client '{}' (see `mcpfinder clients`)", client))?;
            match facade.get_install_command(&key, client).await? {
                Some(install) => println!("{}", serde_json::to_string_pretty(&install)?),
                None => qprintln!(quiet, "No server found for '{}'.", key),
            }
        }

        Commands::Categories => {
            let facade = build_facade(&config).await?;
            let counts = facade.list_categories().await?;
            if counts.is_empty() {
                qprintln!(quiet, "No categories yet; try `mcpfinder sync` first.");
            } else {
                for (name, count) in counts {
                    println!("{:<20} {}", name, count);
                }
            }
        }

        Commands::Browse { category, limit } => {
            let facade = build_facade(&config).await?;
            let results = facade.browse_category(&category, limit).await?;
            if results.is_empty() {
                qprintln!(quiet, "No servers tagged '{}'.", category);
            } else {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }

        Commands::Clients => {
            for client in Client::ALL {
                println!("{}", client.as_str());
            }
        }

        Commands::Sync { status, prune } => {
            let store = SqliteStore::open(&config.db_path().to_string_lossy()).await?;

            if status {
                let logs = store.list_sync_logs().await?;
                if logs.is_empty() {
                    qprintln!(quiet, "No syncs recorded yet.");
                } else {
                    for log in logs {
                        println!(
                            "{:<10} {:<6} {:>6} servers  {}",
                            log.source.as_str(),
                            log.status.as_str(),
                            log.server_count,
                            log.last_synced_at.to_rfc3339(),
                        );
                        if let Some(error) = &log.error {
                            println!("           error: {}", error);
                        }
                    }
                }
                return Ok(());
            }

            if prune {
                let removed = store.purge_stale().await?;
                qprintln!(quiet, "Pruned {} stale server(s).", removed);
                return Ok(());
            }

            let http = sources::build_http_client()?;
            let official = sources::OfficialRegistryClient::new(http.clone());
            let glama = sources::GlamaClient::new(http.clone());
            let smithery = sources::SmitheryClient::new(http);

            let bar = indicatif::ProgressBar::new_spinner();
            if !quiet {
                bar.set_message("syncing upstream registries...");
                bar.enable_steady_tick(std::time::Duration::from_millis(120));
            }
            let counts = mcpfinder::sync_all(&store, &official, &glama, &smithery).await;
            bar.finish_and_clear();

            qprintln!(
                quiet,
                "official: {}  glama: {}  smithery: {}",
                counts[0],
                counts[1],
                counts[2],
            );
        }
    }

    Ok(())
}
