//! Structured logging setup
//!
//! One call at the top of `main`, before anything else runs, so every
//! subsequent log line — including config values and startup failures —
//! goes through the same formatter.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Install a `tracing_subscriber` global default, filtered to `level` and
/// anything `RUST_LOG` adds on top of it.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter_directive()));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
