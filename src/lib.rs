pub mod config;
pub mod context;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

use context::PipelineContext;
use pipeline::batch::{BatchDispatcher, BatchReport, DispatchError, InvocationEvent};

/// Install the global subscriber. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run one invocation: every record of `event`, in order.
pub fn run_invocation(
    ctx: &PipelineContext,
    event: InvocationEvent,
) -> Result<BatchReport, DispatchError> {
    let items = event.into_items();
    tracing::info!(items = items.len(), "{} v{} invoked", config::APP_NAME, config::APP_VERSION);
    BatchDispatcher::new(ctx).process(&items)
}
