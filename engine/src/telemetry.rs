//! Telemetry and Observability
//!
//! Handles setting up `tracing-subscriber` for structured logging.
//! Supports config-driven log levels, environment variable overrides,
//! and format switching between pretty (debug) and JSON (release).
//!
//! Logs go to stderr so replies printed on stdout stay clean.

use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Pretty in debug builds, JSON in release builds
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

fn filter_for(log_level: &str) -> EnvFilter {
    let default_filter = format!("{},concierge_engine={}", log_level, log_level);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize the tracing subscriber with an explicit format.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter > default "info".
/// Calling it more than once is harmless; only the first call installs.
pub fn init_telemetry_with_format(log_level: &str, format: LogFormat) {
    let env_filter = filter_for(log_level);

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_target(false).with_writer(io::stderr))
                .try_init()
                .ok();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_writer(io::stderr),
                )
                .try_init()
                .ok();
        }
    }
}

/// Initialize the tracing subscriber with the given log level from config,
/// in the build's default format.
pub fn init_telemetry_with_level(log_level: &str) {
    init_telemetry_with_format(log_level, LogFormat::for_build());
}

/// Initialize the tracing subscriber with default settings.
///
/// Falls back to "info" level if no `RUST_LOG` env var is set.
/// Use `init_telemetry_with_level` when config is available.
pub fn init_telemetry() {
    init_telemetry_with_level("info");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_telemetry();
        init_telemetry_with_format("debug", LogFormat::Json);
    }
}
