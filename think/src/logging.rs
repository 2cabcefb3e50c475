//! Development-time tracing for debugging the REPL.
//!
//! Reads `RUST_LOG`. Defaults to `warn` if unset. Output goes to stderr,
//! compact format, so diagnostics never interleave with the model reply
//! stream on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for development logging.
///
/// # Example
/// ```bash
/// RUST_LOG=think=debug think "list all files"
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
