//! Diagnostic logging setup for the binaries
//!
//! Stdout carries the protocol response, so all logs go to stderr.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
const DEFAULT_FILTER: &str = "warn";

/// Install the global stderr subscriber
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
