//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` when set, otherwise `default_level`.
///
/// An unparseable level falls back to `warn`.
pub fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a fmt subscriber writing to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(default_level: &str) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
