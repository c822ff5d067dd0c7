// MCPfinder - a local discovery service for the MCP server ecosystem.
// Root library module.

pub mod builders;
pub mod category;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod facade;
pub mod install;
pub mod mcp;
pub mod normalize;
pub mod observability;
pub mod query_sanitization;
pub mod search;
pub mod sources;
pub mod store;
pub mod sync;
pub mod sync_gate;
pub mod types;
pub mod validation;

pub use contracts::{SourceClient, SourcePage, Store};
pub use errors::CoreError;
pub use facade::CoreFacade;
pub use install::{generate_install, InstallPayload, InstallStrategy};
pub use observability::{init_logging, init_logging_with_level, with_trace_id};
pub use search::{get_server_details, search, SearchFilters, SearchResult, ServerDetail};
pub use store::SqliteStore;
pub use sync::{sync_all, sync_source, SyncEngine};
pub use sync_gate::SyncGate;
pub use types::{Client, EnvVar, RegistryType, Server, Slug, Source, SyncLog, SyncStatus, TransportType};
