use tracing_subscriber::{fmt, EnvFilter};

// RUST_LOG wins over LOG_LEVEL when both are set.
const FILTER_VARS: [&str; 2] = ["RUST_LOG", "LOG_LEVEL"];

fn env_filter(default_level: &str) -> EnvFilter {
    FILTER_VARS
        .iter()
        .find_map(|var| EnvFilter::try_from_env(var).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}

/// Initialize the tracing subscriber. The filter comes from `RUST_LOG`,
/// then `LOG_LEVEL`, then the given default level.
pub fn init_tracing(default_level: &str) {
    fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(true)
        .init();
}
