//! Tracing setup

use tracing_subscriber::EnvFilter;

/// Installs a compact `tracing` subscriber filtered by `RUST_LOG`.
///
/// Defaults to `warn` when `RUST_LOG` is unset. Returns `false` if a global
/// subscriber was already installed, so repeated calls are harmless.
///
/// ```
/// sampleflow::logging::init_tracing();
/// // RUST_LOG=sampleflow=trace shows every delivered sample
/// ```
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
