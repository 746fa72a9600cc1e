//! Subscriber setup for the fixture binary.
//!
//! # Priority (highest to lowest)
//!
//! 1. `REPLAY_AUTHORITY_LOG` env var (directives, e.g. `authority_replay=debug`)
//! 2. `RUST_LOG`
//! 3. Default level: `warn`
//!
//! Logs go to stderr so stdout stays a clean `key=value` contract.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Project-specific filter variable.
pub const LOG_ENV_VAR: &str = "REPLAY_AUTHORITY_LOG";

/// Install the global subscriber. Later calls are no-ops.
pub fn init_subscriber() {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .without_time()
        .compact();

    let _ = tracing_subscriber::registry()
        .with(build_env_filter())
        .with(fmt_layer)
        .try_init();
}

fn build_env_filter() -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV_VAR) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new("warn")
}
