//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; hosts that do not install their
//! own subscriber can call [`init_tracing`] once at startup. The filter comes
//! from `RUST_LOG` and defaults to `info`.

use std::str::FromStr;

use courier_domain::CourierError;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Output format for [`init_tracing`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable, one line per event
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for TracingFormat {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(CourierError::Config(format!("Unknown tracing format: {other}"))),
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`CourierError::Config`] if a global subscriber is already set.
pub fn init_tracing(format: TracingFormat) -> Result<(), CourierError> {
    let filter = env_filter();
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = match format {
        TracingFormat::Pretty => builder.try_init(),
        TracingFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    result.map_err(|e| CourierError::Config(format!("Failed to install tracing subscriber: {e}")))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
