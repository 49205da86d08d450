//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops. Intended for
/// binaries, tests and benches - libraries embedding cascade should install
/// their own subscriber instead.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
