//! # Port Message Bus
//!
//! Binds a local [`LocalMessageBus`] to a [`Port`].
//!
//! ```text
//!   emit ──encode──► PortSink::post ─────────────► peer
//!
//!   peer ──► inbound ──► pump task ──decode──► BatchBoundary::run_batched {
//!                                                 local.emit(..) for each
//!                                              }
//! ```
//!
//! Handlers registered through `on`/`once` see inbound traffic; `emit`
//! only goes out. When the inbound stream ends the adapter becomes
//! `Disconnected` for good, emits the catalog's disconnect event locally and
//! silently drops any further sends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use shared_bus::{BusError, BusStats, Handler, LocalMessageBus, MessageBus, Subscription};
use shared_types::{Events, WireMessage};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::boundary::BatchBoundary;
use crate::errors::TransportError;
use crate::port::{Port, PortSink};
use crate::state::ConnectionState;

/// Counters of one adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterStats {
    /// Messages handed to the sink.
    pub sent: u64,
    /// Outbound messages dropped because the port was gone.
    pub dropped: u64,
    /// Raw inbound messages taken off the port.
    pub received: u64,
    /// Inbound messages that failed to decode.
    pub decode_failures: u64,
    /// Boundary invocations.
    pub batches: u64,
    /// Diagnostics of the local bus inbound traffic is dispatched on.
    pub local: BusStats,
}

#[derive(Debug, Default)]
struct AdapterCounters {
    sent: AtomicU64,
    dropped: AtomicU64,
    received: AtomicU64,
    decode_failures: AtomicU64,
    batches: AtomicU64,
}

/// State shared between the adapter and its pump task.
struct Shared<E: Events> {
    name: String,
    local: LocalMessageBus<E>,
    state: watch::Sender<ConnectionState>,
    counters: AdapterCounters,
}

impl<E: Events> Shared<E> {
    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Decode a batch and dispatch it inside one boundary scope.
    fn deliver(&self, raw: Vec<WireMessage>, boundary: &dyn BatchBoundary) {
        let mut events = Vec::with_capacity(raw.len());
        for message in raw {
            self.counters.received.fetch_add(1, Ordering::Relaxed);
            let topic = message.topic.clone();
            match E::from_wire(message) {
                Ok(event) if Some(event.topic()) == E::disconnected_event().map(|e| e.topic()) => {
                    self.counters.decode_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(port = %self.name, topic = %topic, "Peer sent a local-only topic, dropping");
                }
                Ok(event) => events.push(event),
                Err(err) => {
                    self.counters.decode_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(port = %self.name, topic = %topic, error = %err, "Dropping undecodable inbound message");
                }
            }
        }

        if events.is_empty() {
            return;
        }

        self.counters.batches.fetch_add(1, Ordering::Relaxed);
        trace!(port = %self.name, size = events.len(), "Dispatching inbound batch");

        boundary.run_batched(&mut || {
            for event in events.drain(..) {
                let topic = event.name();
                if let Err(err) = self.local.emit(event) {
                    debug!(port = %self.name, topic, error = %err, "Inbound message not dispatched");
                }
            }
        });
    }

    /// Flip to `Disconnected`. Only the first call has any effect.
    fn mark_disconnected(&self, reason: &'static str) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                false
            } else {
                *state = ConnectionState::Disconnected;
                true
            }
        });

        if changed {
            info!(port = %self.name, reason, "Port disconnected");
            if let Some(event) = E::disconnected_event() {
                if let Err(err) = self.local.emit(event) {
                    debug!(port = %self.name, error = %err, "Disconnect event not dispatched");
                }
            }
        }
        changed
    }
}

async fn pump<E: Events>(
    shared: Arc<Shared<E>>,
    mut inbound: mpsc::UnboundedReceiver<WireMessage>,
    boundary: Arc<dyn BatchBoundary>,
) {
    while let Some(first) = inbound.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = inbound.try_recv() {
            batch.push(next);
        }
        shared.deliver(batch, boundary.as_ref());
    }
    shared.mark_disconnected("inbound stream ended");
}

/// [`MessageBus`] over one port connection.
pub struct PortMessageBus<E: Events> {
    shared: Arc<Shared<E>>,
    sink: Arc<dyn PortSink>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<E: Events> PortMessageBus<E> {
    /// Take ownership of `port` and start dispatching its inbound traffic.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(port: Port, boundary: Arc<dyn BatchBoundary>) -> Self {
        let Port {
            name,
            sink,
            inbound,
        } = port;
        let (state, _) = watch::channel(ConnectionState::Connected);

        let shared = Arc::new(Shared {
            name,
            local: LocalMessageBus::new(),
            state,
            counters: AdapterCounters::default(),
        });
        let pump = tokio::spawn(pump(Arc::clone(&shared), inbound, boundary));

        debug!(port = %shared.name, "Port adapter connected");
        Self {
            shared,
            sink,
            pump: Mutex::new(Some(pump)),
        }
    }

    /// Identity of the underlying port.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Observe connection state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Resolve once the adapter is `Disconnected`.
    pub async fn disconnected(&self) {
        let mut state = self.watch_state();
        // The sender lives in `self`, so this cannot fail while we borrow it.
        let _ = state
            .wait_for(|state| *state == ConnectionState::Disconnected)
            .await;
    }

    #[must_use]
    pub fn stats(&self) -> AdapterStats {
        let counters = &self.shared.counters;
        AdapterStats {
            sent: counters.sent.load(Ordering::Relaxed),
            dropped: counters.dropped.load(Ordering::Relaxed),
            received: counters.received.load(Ordering::Relaxed),
            decode_failures: counters.decode_failures.load(Ordering::Relaxed),
            batches: counters.batches.load(Ordering::Relaxed),
            local: self.shared.local.stats(),
        }
    }

    fn drop_outbound(&self, topic: &'static str, reason: &'static str) {
        self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed);
        debug!(port = %self.shared.name, topic, reason, "Dropping outbound message");
    }
}

impl<E: Events> MessageBus<E> for PortMessageBus<E> {
    fn on(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError> {
        self.shared.local.on(topic, handler)
    }

    fn once(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError> {
        self.shared.local.once(topic, handler)
    }

    fn emit(&self, event: E) -> Result<(), BusError> {
        if self.shared.local.is_closed() {
            return Err(BusError::Closed);
        }

        let topic = event.name();
        if self.state() == ConnectionState::Disconnected {
            self.drop_outbound(topic, "port disconnected");
            return Ok(());
        }

        let message = event.to_wire().map_err(BusError::Encode)?;
        match self.sink.post(message) {
            Ok(()) => {
                self.shared.counters.sent.fetch_add(1, Ordering::Relaxed);
                trace!(port = %self.shared.name, topic, "Sent");
                Ok(())
            }
            Err(TransportError::Disconnected) => {
                self.drop_outbound(topic, "sink closed");
                Ok(())
            }
            Err(err) => {
                warn!(port = %self.shared.name, topic, error = %err, "Outbound send failed");
                Err(BusError::Transport(err.to_string()))
            }
        }
    }

    fn destroy(&self) {
        if self.shared.local.is_closed() {
            return;
        }
        self.shared.local.destroy();
        self.sink.close();
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        self.shared.mark_disconnected("adapter destroyed");
        debug!(port = %self.shared.name, "Port adapter destroyed");
    }

    fn is_closed(&self) -> bool {
        self.shared.local.is_closed()
    }
}

impl<E: Events> Drop for PortMessageBus<E> {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.get_mut().take() {
            pump.abort();
        }
        self.sink.close();
    }
}
