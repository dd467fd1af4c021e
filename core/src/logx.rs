use tracing_subscriber::{fmt, EnvFilter};

/// Initialize `tracing` once. `RUST_LOG` wins; otherwise `fallback` is the
/// filter (e.g. `"info"` or a full directive string).
pub fn init(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
