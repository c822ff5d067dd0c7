// Error taxonomy: one thiserror enum per layer instead of bare anyhow strings crossing a
// component boundary.

use thiserror::Error;

/// Errors the Core Facade can surface to a host. Internal helpers use `anyhow::Result`
/// and are converted to one of these at the Store / Sync Engine / Facade boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Persistence cannot be opened or written. Fatal only at process startup.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The on-disk schema doesn't match what this build expects.
    #[error("store is corrupt: {0}")]
    Corrupt(String),

    /// A batch contained the same `id` twice (should be prevented upstream by the caller).
    #[error("duplicate id within a single upsert batch: {0}")]
    Conflict(String),

    /// An upstream registry returned a non-2xx or the request failed in transit.
    #[error("source {source} unavailable (status={status:?}): {message}")]
    SourceUnavailable {
        source: String,
        status: Option<u16>,
        message: String,
    },

    /// `getServerDetails` / `getInstallCommand` on an unknown key.
    #[error("not found: {0}")]
    NotFound(String),

    /// Out-of-range limit, unknown enum value, or empty required field.
    #[error("invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },
}

impl CoreError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
