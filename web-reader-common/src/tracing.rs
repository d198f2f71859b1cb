//! Tracing initialization for the gateway.
//!
//! Sets up a `tracing_subscriber` registry with filtering from `RUST_LOG`.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls the log level and filtering. Examples:
//!   - `RUST_LOG=debug` - Enable debug logging for all modules
//!   - `RUST_LOG=web_reader_server=debug` - Enable debug for the server crate
//!   - `RUST_LOG=warn,tower_http=debug` - Warn by default, debug for request traces

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    registry::Registry,
};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(default_level: &str) -> impl ::tracing::Subscriber + Send + Sync + 'static {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    Registry::default()
        .with(env_filter(default_level))
        .with(fmt_layer)
}

/// Initialize the tracing subscriber with `RUST_LOG` filtering (default `info`).
///
/// # Panics
///
/// Panics if a global subscriber is already set.
///
/// # Example
///
/// ```no_run
/// use web_reader_common::tracing::init_tracing;
///
/// init_tracing();
/// tracing::info!("Server starting");
/// ```
pub fn init_tracing() {
    subscriber("info").init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_installs_once() {
        let _ = subscriber("info").try_init();
        assert!(subscriber("debug").try_init().is_err());
    }

    #[test]
    fn test_env_filter_parses_module_specific() {
        let filter = EnvFilter::new("warn,web_reader_server=debug,tower_http=debug");
        drop(filter);
    }
}
