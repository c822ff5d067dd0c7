// Runtime configuration, read once at startup from environment variables per §6.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_STALE_AFTER_SECS: u64 = 15 * 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub stale_after: Duration,
    pub http_timeout: Duration,
    pub page_size: usize,
}

impl Config {
    /// `MCPFINDER_DATA_DIR` overrides the default `~/.mcpfinder/`; every other setting
    /// currently has no environment override and uses its built-in default.
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var("MCPFINDER_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => {
                let home = dirs_home().context("could not determine home directory")?;
                home.join(".mcpfinder")
            }
        };

        Ok(Self {
            data_dir,
            stale_after: Duration::from_secs(DEFAULT_STALE_AFTER_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("data.db")
    }
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_env_override_is_respected() {
        std::env::set_var("MCPFINDER_DATA_DIR", "/tmp/mcpfinder-test-config");
        let config = Config::from_env().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/mcpfinder-test-config"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/mcpfinder-test-config/data.db"));
        std::env::remove_var("MCPFINDER_DATA_DIR");
    }
}
