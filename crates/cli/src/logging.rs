//! Console logging setup

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).with_target(false).init();
}
