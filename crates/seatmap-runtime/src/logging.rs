#![forbid(unsafe_code)]

//! Optional `tracing-subscriber` installation for hosts that do not bring
//! their own.
//!
//! Filtering follows `SEATMAP_LOG` (standard `EnvFilter` syntax), falling
//! back to [`DEFAULT_FILTER`]. Every event in the workspace uses a
//! `seatmap.*` target, so `SEATMAP_LOG=seatmap.gesture=trace` isolates one
//! subsystem.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the filter.
pub const ENV_VAR: &str = "SEATMAP_LOG";

/// Filter used when [`ENV_VAR`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "seatmap=info";

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

/// Installing the global subscriber failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to install log subscriber: {0}")]
pub struct LogInitError(String);

/// Filter from [`ENV_VAR`], or [`DEFAULT_FILTER`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global formatter. Fails if a global subscriber is already set.
pub fn install(format: LogFormat) -> Result<(), LogInitError> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    let result = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| LogInitError(e.to_string()))
}
