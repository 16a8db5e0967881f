//! Tracing setup for the `pharmquest` binary and unit tests.
//!
//! Stdout belongs to the player (and to `--json` snapshots), so every event
//! is written to stderr.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Quiet by default: only warnings reach the terminal unless `RUST_LOG`
/// says otherwise
pub fn init() {
    init_with_level("warn")
}

/// Install the global subscriber, falling back to `default_level` when
/// `RUST_LOG` is unset or unparsable
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Debug-level events routed through the test harness; safe to call from
/// every test
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
