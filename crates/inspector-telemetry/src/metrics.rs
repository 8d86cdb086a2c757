//! Prometheus metrics for the inspector link.
//!
//! All metrics follow the naming convention: `panel_<area>_<metric>_<unit>`
//!
//! Bus and adapter components keep their own plain counters; the runtime
//! copies them into these metrics periodically with [`CounterSync`].

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PORT METRICS
    // =========================================================================

    /// Messages handed to the port
    pub static ref PORT_MESSAGES_SENT: IntCounter = IntCounter::new(
        "panel_port_messages_sent_total",
        "Outbound messages handed to the port"
    ).expect("metric creation failed");

    /// Raw messages taken off the port
    pub static ref PORT_MESSAGES_RECEIVED: IntCounter = IntCounter::new(
        "panel_port_messages_received_total",
        "Inbound messages taken off the port"
    ).expect("metric creation failed");

    /// Messages dropped, by reason
    pub static ref PORT_MESSAGES_DROPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("panel_port_messages_dropped_total", "Messages dropped before delivery"),
        &["reason"]  // reason: disconnected/evicted
    ).expect("metric creation failed");

    /// Inbound messages that failed to decode
    pub static ref PORT_DECODE_FAILURES: IntCounter = IntCounter::new(
        "panel_port_decode_failures_total",
        "Inbound messages rejected by the catalog"
    ).expect("metric creation failed");

    /// Batch boundary invocations
    pub static ref PORT_INBOUND_BATCHES: IntCounter = IntCounter::new(
        "panel_port_inbound_batches_total",
        "Inbound batches dispatched inside one boundary"
    ).expect("metric creation failed");

    /// Connected agents (0 or 1)
    pub static ref PORT_CONNECTED: IntGauge = IntGauge::new(
        "panel_port_connected",
        "Whether an agent port is currently connected"
    ).expect("metric creation failed");

    /// Sessions opened since start
    pub static ref SESSIONS_OPENED: IntCounter = IntCounter::new(
        "panel_sessions_opened_total",
        "Inspector sessions opened"
    ).expect("metric creation failed");

    // =========================================================================
    // BUS METRICS
    // =========================================================================

    /// Handlers that failed or panicked
    pub static ref BUS_HANDLER_FAILURES: IntCounter = IntCounter::new(
        "panel_bus_handler_failures_total",
        "Handler invocations that failed or panicked"
    ).expect("metric creation failed");

    /// Current queue depth per priority class
    pub static ref SCHEDULER_QUEUE_DEPTH: IntGaugeVec = IntGaugeVec::new(
        Opts::new("panel_scheduler_queue_depth", "Messages waiting per priority class"),
        &["class"]  // class: critical/normal/background
    ).expect("metric creation failed");

    /// Starvation guard promotions
    pub static ref SCHEDULER_PROMOTIONS: IntCounter = IntCounter::new(
        "panel_scheduler_promotions_total",
        "Selections where a starved class was promoted"
    ).expect("metric creation failed");

    /// Coalesced requests
    pub static ref SCHEDULER_COALESCED: IntCounter = IntCounter::new(
        "panel_scheduler_coalesced_total",
        "Emits merged into an already queued request"
    ).expect("metric creation failed");
}

/// Handle proving the metrics were registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _registered: (),
}

/// Register all metrics with the global registry. Safe to call twice.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Port
        Box::new(PORT_MESSAGES_SENT.clone()),
        Box::new(PORT_MESSAGES_RECEIVED.clone()),
        Box::new(PORT_MESSAGES_DROPPED.clone()),
        Box::new(PORT_DECODE_FAILURES.clone()),
        Box::new(PORT_INBOUND_BATCHES.clone()),
        Box::new(PORT_CONNECTED.clone()),
        Box::new(SESSIONS_OPENED.clone()),
        // Bus
        Box::new(BUS_HANDLER_FAILURES.clone()),
        Box::new(SCHEDULER_QUEUE_DEPTH.clone()),
        Box::new(SCHEDULER_PROMOTIONS.clone()),
        Box::new(SCHEDULER_COALESCED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _registered: () })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Mirrors a component's running total into a Prometheus counter.
///
/// Totals that go backwards (a new session started from zero) reset the
/// baseline without touching the counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct CounterSync {
    last: u64,
}

impl CounterSync {
    pub fn advance(&mut self, counter: &IntCounter, total: u64) {
        if total > self.last {
            counter.inc_by(total - self.last);
        }
        self.last = total;
    }
}
