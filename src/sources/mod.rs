// Upstream registry pullers (§6). Each submodule owns one source's wire format and maps
// it onto `normalize::RawEntry`; the Sync Engine never sees source-specific JSON shapes,
// only the `SourceClient` trait from `contracts.rs`.

pub mod glama;
pub mod official;
pub mod smithery;

use std::time::Duration;

/// Shared HTTP client construction: a plain `reqwest::Client` (connection pooling left to
/// reqwest's defaults) with a 30 s per-request timeout.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("mcpfinder/", env!("CARGO_PKG_VERSION")))
        .build()
}

pub use glama::GlamaClient;
pub use official::OfficialRegistryClient;
pub use smithery::SmitheryClient;
