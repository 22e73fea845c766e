// Observability
// Structured logging setup plus a trace-id wrapper that ties every
// request-scoped operation to a UUID and a duration measurement.

use anyhow::Result;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize the logging infrastructure.
/// Called once at application startup; calling it again (as parallel tests
/// do) is a no-op.
pub fn init_logging() -> Result<()> {
    // Default: keyapi at info, dependencies at warn. RUST_LOG overrides.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("keyapi=info,warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(true);

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => {
            info!("keyapi observability initialized");
            Ok(())
        }
        // Already initialized, which is fine in test environments
        Err(_) => Ok(()),
    }
}

/// Run an operation with a generated trace id, logging its outcome and
/// duration. Store and shaping errors bubble through unchanged.
pub async fn with_trace_id<F, T>(operation: &str, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let trace_id = Uuid::new_v4();
    let start = Instant::now();
    debug!(%trace_id, operation, "operation started");

    let result = fut.await;
    let elapsed_ms = start.elapsed().as_millis();

    match &result {
        Ok(_) => debug!(%trace_id, operation, elapsed_ms, "operation completed"),
        Err(e) => warn!(%trace_id, operation, elapsed_ms, error = %e, "operation failed"),
    }

    result
}
