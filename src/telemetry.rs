//! Structured logging set-up shared by the binaries.
//!
//! Events go to stderr so that stdout stays reserved for JSON output. The
//! filter is read from `FLOTILLA_LOG` using `tracing-subscriber` directive
//! syntax and falls back to `warn`.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "FLOTILLA_LOG";

/// Directive used when [`LOG_ENV`] is unset or malformed.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Raised when a global subscriber is already installed.
#[derive(Debug, Error)]
#[error("failed to install the log subscriber: {0}")]
pub struct TelemetryError(#[from] tracing_subscriber::util::TryInitError);

/// Builds the filter for an optional directive string.
#[must_use]
pub fn filter_for(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs the global subscriber using [`LOG_ENV`].
///
/// # Errors
///
/// Returns [`TelemetryError`] when a subscriber was already installed.
pub fn init() -> Result<(), TelemetryError> {
    let directive = std::env::var(LOG_ENV).ok();
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter_for(directive.as_deref()))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, "warn")]
    #[case(Some("debug"), "debug")]
    #[case(Some("flotilla=trace"), "flotilla=trace")]
    #[case(Some("flotilla=loudest"), "warn")]
    fn filters_fall_back_to_warn(#[case] directive: Option<&str>, #[case] expected: &str) {
        assert_eq!(filter_for(directive).to_string(), expected);
    }
}
