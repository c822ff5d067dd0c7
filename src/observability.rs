// Centralized observability for MCPfinder: structured logging via `tracing` plus a
// small trace-id helper for wrapping facade operations with start/success/failure spans.

use anyhow::Result;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

static OPERATION_COUNTER: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Initialize logging once at process startup. The stdio MCP binary calls the `quiet`
/// variant with stderr-only output since stdout carries the JSON-RPC framing.
pub fn init_logging() -> Result<()> {
    init_logging_with_level(false, false)
}

pub fn init_logging_with_level(verbose: bool, quiet: bool) -> Result<()> {
    let filter_level = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("mcpfinder=debug,info")
    } else {
        EnvFilter::new("mcpfinder=info,warn")
    };

    let env_filter = if quiet {
        EnvFilter::new("error")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or(filter_level)
    } else {
        filter_level
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(!quiet)
        .with_line_number(!quiet)
        .with_file(!quiet)
        .with_ansi(true)
        .with_writer(std::io::stderr);

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => Ok(()),
        Err(_) => Ok(()), // already initialized — fine in tests
    }
}

/// A trace-scoped context, carried through one facade call or one `syncSource` run.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub trace_id: Uuid,
    pub operation: String,
    start_time: Instant,
}

impl OperationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            operation: operation.into(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Run `f`, logging start/success/failure with a shared trace id. Used by the Core
/// Facade and the Sync Engine so every operation leaves one info-level line on success
/// and one error-level line (with the full anyhow chain) on failure.
pub async fn with_trace_id<F, T>(operation: &str, f: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let ctx = OperationContext::new(operation);
    info!(trace_id = %ctx.trace_id, "starting {}", operation);

    let result = f.await;
    let elapsed = ctx.elapsed();

    match &result {
        Ok(_) => {
            info!(trace_id = %ctx.trace_id, elapsed_ms = elapsed.as_millis(), "completed {}", operation);
            OPERATION_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            error!(
                trace_id = %ctx.trace_id,
                elapsed_ms = elapsed.as_millis(),
                error = %e,
                "failed {}", operation
            );
            ERROR_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
    }

    result
}

pub fn get_metrics() -> serde_json::Value {
    serde_json::json!({
        "operations_total": OPERATION_COUNTER.load(Ordering::Relaxed),
        "operations_failed": ERROR_COUNTER.load(Ordering::Relaxed),
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// Structured error logging with the full anyhow cause chain, used by the Sync Engine
/// when a source fails so the stderr line names every layer, not just the top one.
#[instrument(skip(error))]
pub fn log_error_chain(operation: &str, error: &anyhow::Error) {
    let chain = error
        .chain()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(" -> ");
    error!(operation, error_chain = %chain, "error occurred");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn with_trace_id_returns_inner_result() {
        let result = with_trace_id("test_op", async { Ok::<_, anyhow::Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn with_trace_id_propagates_errors() {
        let result: Result<()> =
            with_trace_id("test_op_fail", async { Err(anyhow::anyhow!("boom")) }).await;
        assert!(result.is_err());
    }
}
