//! Copies session counters into the Prometheus registry.

use inspector_telemetry::{
    CounterSync, BUS_HANDLER_FAILURES, PORT_CONNECTED, PORT_DECODE_FAILURES,
    PORT_INBOUND_BATCHES, PORT_MESSAGES_DROPPED, PORT_MESSAGES_RECEIVED, PORT_MESSAGES_SENT,
    SCHEDULER_COALESCED, SCHEDULER_PROMOTIONS, SCHEDULER_QUEUE_DEPTH,
};
use shared_types::PriorityClass;

use crate::session::InspectorSession;

/// Baselines for the counters of the current session.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    sent: CounterSync,
    received: CounterSync,
    dropped_disconnected: CounterSync,
    dropped_evicted: CounterSync,
    decode_failures: CounterSync,
    batches: CounterSync,
    handler_failures: CounterSync,
    promotions: CounterSync,
    coalesced: CounterSync,
}

impl SessionMetrics {
    /// Publish the current totals of `session`.
    pub fn record(&mut self, session: &InspectorSession) {
        let adapter = session.adapter_stats();
        let scheduler = session.scheduler_stats();

        self.sent.advance(&PORT_MESSAGES_SENT, adapter.sent);
        self.received.advance(&PORT_MESSAGES_RECEIVED, adapter.received);
        self.dropped_disconnected.advance(
            &PORT_MESSAGES_DROPPED.with_label_values(&["disconnected"]),
            adapter.dropped,
        );
        self.dropped_evicted.advance(
            &PORT_MESSAGES_DROPPED.with_label_values(&["evicted"]),
            scheduler.evicted,
        );
        self.decode_failures
            .advance(&PORT_DECODE_FAILURES, adapter.decode_failures);
        self.batches.advance(&PORT_INBOUND_BATCHES, adapter.batches);
        self.handler_failures
            .advance(&BUS_HANDLER_FAILURES, adapter.local.handler_failures);
        self.promotions
            .advance(&SCHEDULER_PROMOTIONS, scheduler.promotions);
        self.coalesced
            .advance(&SCHEDULER_COALESCED, scheduler.coalesced);

        for class in PriorityClass::ALL {
            SCHEDULER_QUEUE_DEPTH
                .with_label_values(&[class.as_str()])
                .set(i64::try_from(scheduler.queued_in(class)).unwrap_or(i64::MAX));
        }
        PORT_CONNECTED.set(i64::from(session.state().is_connected()));
    }

    /// Start counting a new session from zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// No session is connected.
    pub fn record_idle(&self) {
        PORT_CONNECTED.set(0);
        for class in PriorityClass::ALL {
            SCHEDULER_QUEUE_DEPTH
                .with_label_values(&[class.as_str()])
                .set(0);
        }
    }
}
