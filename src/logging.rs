//! `tracing` subscriber setup for the binary.
//!
//! Filter directives come from `PROTRADER_LOG`, then `RUST_LOG`, then the
//! built-in default. `PROTRADER_LOG_JSON` switches to JSON lines unless it
//! is set to an off value such as `0` or `false`.

use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

pub const FILTER_ENV: &str = "PROTRADER_LOG";
pub const FORMAT_ENV: &str = "PROTRADER_LOG_JSON";
pub const DEFAULT_DIRECTIVES: &str = "protrader=info";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Format selected by the raw value of `PROTRADER_LOG_JSON`.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            None => LogFormat::Text,
            Some(v) if matches!(v.as_str(), "" | "0" | "false" | "no" | "off") => LogFormat::Text,
            Some(_) => LogFormat::Json,
        }
    }
}

/// First non-blank directive string, falling back to the default.
pub fn filter_directives(own: Option<&str>, rust_log: Option<&str>) -> String {
    [own, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES)
        .to_string()
}

/// Install the global subscriber. A malformed filter falls back to the
/// default directives and is reported once logging is up.
pub fn init_logging() {
    let own = std::env::var(FILTER_ENV).ok();
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(own.as_deref(), rust_log.as_deref());

    let (env_filter, rejected) = match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new(DEFAULT_DIRECTIVES), Some(err)),
    };

    let format = LogFormat::from_env_value(std::env::var(FORMAT_ENV).ok().as_deref());
    match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_current_span(false)
            .init(),
        LogFormat::Text => fmt().compact().with_env_filter(env_filter).with_target(false).init(),
    }

    if let Some(err) = rejected {
        warn!(directives = %directives, error = %err, "Invalid log filter, using defaults");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
