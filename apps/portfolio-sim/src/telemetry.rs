//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the configured level.
//!
//! # Usage
//!
//! ```rust,ignore
//! use portfolio_sim::config::LoggingConfig;
//! use portfolio_sim::telemetry::init_tracing;
//!
//! init_tracing(&LoggingConfig::default())?;
//! ```

use std::error::Error;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;

/// Install the global fmt subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let span_events = if config.include_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.level))
        .with_span_events(span_events);

    match config.format.as_str() {
        "pretty" => builder.pretty().try_init(),
        "full" => builder.try_init(),
        _ => builder.compact().try_init(),
    }
}

/// Filter from `RUST_LOG`, or `portfolio_sim=<level>` with other crates at warn.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,portfolio_sim={}", level.to_lowercase())))
}
