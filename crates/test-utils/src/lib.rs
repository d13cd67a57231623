//! Shared helpers for `runctl` integration tests.

pub mod builders;
pub mod listeners;

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-friendly subscriber once per test binary.
///
/// Output goes through the harness capture, so it only shows up for failing
/// tests (or with `--nocapture`). The filter comes from `RUNCTL_LOG`, then
/// `RUST_LOG`, and defaults to `warn` so cleanup noise stays out of the way:
///
/// `RUNCTL_LOG=runctl=debug cargo test --test timeout_and_cancel`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("RUNCTL_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        // Another harness may have installed a subscriber already.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_names(true)
            .try_init();
    });
}
