// Model Context Protocol stdio adapter. Speaks line-delimited JSON-RPC over stdin/stdout
// and dispatches to the five Core Facade operations; framing and tool-name registration
// are this module's job precisely because the core spec keeps them out of its own scope.

pub mod config;
pub mod server;
pub mod types;

pub use config::MCPConfig;
pub use server::MCPServer;
pub use types::*;
