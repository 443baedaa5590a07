//! Logging initialization

use tracing_subscriber::EnvFilter;

/// Initialize tracing. `RUST_LOG` overrides the default `info` level;
/// `RUST_LOG=debug` shows every solver sweep.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
