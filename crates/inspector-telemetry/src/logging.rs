//! Subscriber setup.
//!
//! One `EnvFilter` plus either a human-readable or a JSON `fmt` layer,
//! installed as the global default.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber.
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level {:?}: {e}", config.log_level)))?;

    // JSON output for containers/production
    let json_layer = (config.console_output && config.json_logs).then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    // Pretty output for development
    let fmt_layer = (config.console_output && !config.json_logs).then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Structured log entry tagged with the session it belongs to.
#[macro_export]
macro_rules! log_event {
    (info, $session:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(session = %$session, $($($field)*,)? $msg)
    };
    (warn, $session:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(session = %$session, $($($field)*,)? $msg)
    };
    (error, $session:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(session = %$session, $($($field)*,)? $msg)
    };
    (debug, $session:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(session = %$session, $($($field)*,)? $msg)
    };
}
