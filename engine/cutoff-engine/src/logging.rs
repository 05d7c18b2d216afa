//! Logging and tracing setup
//!
//! Logs go to stderr so that forecast output on stdout stays machine readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter};

use crate::error::{CutoffError, Result};

/// Initialize logging with `RUST_LOG`, defaulting to `info`
pub fn initialize_logging() -> Result<()> {
    initialize_logging_with_config("info", "compact")
}

/// Initialize logging with a level and format (`json`, `pretty`, anything else is compact).
///
/// `RUST_LOG` still takes precedence over `level` when set.
pub fn initialize_logging_with_config(level: &str, format: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = match format {
        "json" => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        "pretty" => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        _ => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CutoffError::Logging(e.to_string()))
}
