//! Structured logging setup.
//!
//! The library itself only emits `tracing` events; embedding applications that
//! want console output can call [`init`] (or configure their own subscriber).

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init() {
    init_with_filter("info");
}

/// Install a formatting subscriber with the given default filter directives,
/// still overridable through `RUST_LOG`.
pub fn init_with_filter(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
