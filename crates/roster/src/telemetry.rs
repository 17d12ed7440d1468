use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::EnvFilter;

/// Per-statement sqlx logging is noisy at `info`; keep it at `warn` unless the
/// operator asked for something else.
const SQLX_DIRECTIVE: &str = "sqlx=warn";

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(std::env::var("RUST_LOG").ok(), &config.log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

fn build_filter(rust_log: Option<String>, log_level: &str) -> Result<EnvFilter, TelemetryError> {
    // RUST_LOG wins over APP_LOG_LEVEL when it parses.
    if let Some(filter) = rust_log.and_then(|raw| EnvFilter::try_new(raw).ok()) {
        return Ok(filter);
    }

    let filter = EnvFilter::try_new(log_level).map_err(|source| TelemetryError::EnvFilter {
        value: log_level.to_string(),
        source,
    })?;

    if log_level.contains("sqlx") {
        return Ok(filter);
    }

    match SQLX_DIRECTIVE.parse::<Directive>() {
        Ok(directive) => Ok(filter.add_directive(directive)),
        Err(_) => Ok(filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_configured_level() {
        let filter = build_filter(None, "debug").expect("filter builds");
        let rendered = filter.to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("sqlx=warn"));
    }

    #[test]
    fn rust_log_takes_precedence() {
        let filter = build_filter(Some("roster=trace".to_string()), "info").expect("filter builds");
        assert!(filter.to_string().contains("roster=trace"));
    }

    #[test]
    fn rejects_invalid_level() {
        let error = build_filter(None, "roster=loud").expect_err("invalid filter");
        assert!(error.to_string().contains("roster=loud"));
    }
}
