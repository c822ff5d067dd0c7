// MCP stdio adapter identity: protocol version, server identity, and the data directory
// the Core Facade's Store opens against.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MCPConfig {
    pub protocol_version: String,
    pub server_name: String,
    pub server_version: String,
    pub data_dir: String,
}

impl Default for MCPConfig {
    fn default() -> Self {
        Self {
            protocol_version: "2024-11-05".to_string(),
            server_name: "mcpfinder".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: String::new(),
        }
    }
}

impl MCPConfig {
    /// Applies `MCPFINDER_DATA_DIR` on top of the default, falling back to
    /// `crate::config::Config`'s own resolution when unset.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::default();
        let data_dir = crate::config::Config::from_env()?;
        config.data_dir = data_dir.data_dir.to_string_lossy().to_string();
        Ok(config)
    }
}
