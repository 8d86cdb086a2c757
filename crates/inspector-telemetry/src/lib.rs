//! # Inspector Telemetry
//!
//! Logging and metrics for the inspector panel.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter` and a plain or JSON
//!   `fmt` layer
//! - **Metrics**: Prometheus counters and gauges in a private registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inspector_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `inspector-panel` | Service name in logs |
//! | `PANEL_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `PANEL_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `PANEL_JSON_LOGS` | `false` | JSON log lines |

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, CounterSync, MetricsHandle, BUS_HANDLER_FAILURES,
    PORT_CONNECTED, PORT_DECODE_FAILURES, PORT_INBOUND_BATCHES, PORT_MESSAGES_DROPPED,
    PORT_MESSAGES_RECEIVED, PORT_MESSAGES_SENT, SCHEDULER_COALESCED, SCHEDULER_PROMOTIONS,
    SCHEDULER_QUEUE_DEPTH, SESSIONS_OPENED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Initialize metrics first
    let metrics = register_metrics()?;

    logging::init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
