//! # Local Message Bus
//!
//! In-process implementation of [`MessageBus`]. Dispatch is synchronous and
//! runs on the emitter's thread of control.
//!
//! ## Dispatch Semantics
//!
//! - Handlers for a topic run in registration order.
//! - `emit` works on a snapshot of the registrations taken when it starts:
//!   a handler registered during the emit first runs on the next emit, and a
//!   handler unsubscribed during the emit is skipped if not yet reached.
//! - A failing or panicking handler is isolated: the remaining handlers
//!   still run and the emitter never sees the failure.
//! - The registry lock is never held while a handler runs, so handlers may
//!   freely call back into the bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use shared_types::{Events, Topic};
use tracing::{debug, warn};

use crate::bus::MessageBus;
use crate::errors::{BusError, HandlerError};
use crate::handler::Handler;
use crate::subscription::{Subscription, Unregister};

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that ran to completion.
    pub delivered: usize,
    /// Snapshot entries skipped because they were unsubscribed mid-dispatch.
    pub skipped: usize,
    /// Handlers that failed or panicked.
    pub failures: Vec<HandlerError>,
}

impl DispatchReport {
    /// True if no handler failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Counters of a local bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Events dispatched.
    pub emitted: u64,
    /// Successful handler invocations.
    pub delivered: u64,
    /// Failed handler invocations.
    pub handler_failures: u64,
    /// Registrations currently live.
    pub handlers: usize,
}

struct Registration<E> {
    id: u64,
    handler: Handler<E>,
    once: bool,
    active: Arc<AtomicBool>,
}

impl<E> Clone for Registration<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: self.handler.clone(),
            once: self.once,
            active: Arc::clone(&self.active),
        }
    }
}

struct RegistryState<E: Events> {
    closed: bool,
    next_id: u64,
    handlers: HashMap<E::Topic, Vec<Registration<E>>>,
}

struct Registry<E: Events> {
    state: Mutex<RegistryState<E>>,
    emitted: AtomicU64,
    delivered: AtomicU64,
    handler_failures: AtomicU64,
}

impl<E: Events> Unregister for Registry<E> {
    fn unregister(&self, id: u64) {
        let mut state = self.state.lock();
        state.handlers.retain(|_, registrations| {
            registrations.retain(|registration| registration.id != id);
            !registrations.is_empty()
        });
    }
}

/// In-process typed event bus.
///
/// Cloning yields another handle to the same registry.
pub struct LocalMessageBus<E: Events> {
    registry: Arc<Registry<E>>,
}

impl<E: Events> LocalMessageBus<E> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                state: Mutex::new(RegistryState {
                    closed: false,
                    next_id: 0,
                    handlers: HashMap::new(),
                }),
                emitted: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                handler_failures: AtomicU64::new(0),
            }),
        }
    }

    /// Dispatch an event and report per-handler outcomes.
    pub fn emit_with_report(&self, event: E) -> Result<DispatchReport, BusError> {
        let topic = event.topic();
        let snapshot = {
            let state = self.registry.state.lock();
            if state.closed {
                return Err(BusError::Closed);
            }
            state.handlers.get(&topic).cloned().unwrap_or_default()
        };

        self.registry.emitted.fetch_add(1, Ordering::Relaxed);
        let mut report = DispatchReport::default();

        for registration in snapshot {
            if registration.once {
                // Claim the single delivery before running, so a re-entrant
                // emit cannot deliver it twice.
                if !registration.active.swap(false, Ordering::AcqRel) {
                    report.skipped += 1;
                    continue;
                }
                self.registry.unregister(registration.id);
            } else if !registration.active.load(Ordering::Acquire) {
                report.skipped += 1;
                continue;
            }

            match registration
                .handler
                .invoke(&event, topic.name(), registration.id)
            {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(
                        topic = topic.name(),
                        subscription = registration.id,
                        error = %err,
                        "Handler failed, continuing dispatch"
                    );
                    report.failures.push(err);
                }
            }
        }

        self.registry
            .delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.registry
            .handler_failures
            .fetch_add(report.failures.len() as u64, Ordering::Relaxed);

        Ok(report)
    }

    /// Number of live handlers on `topic`.
    #[must_use]
    pub fn handler_count(&self, topic: E::Topic) -> usize {
        self.registry
            .state
            .lock()
            .handlers
            .get(&topic)
            .map_or(0, Vec::len)
    }

    /// Snapshot of the bus counters.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        let handlers = self
            .registry
            .state
            .lock()
            .handlers
            .values()
            .map(Vec::len)
            .sum();

        BusStats {
            emitted: self.registry.emitted.load(Ordering::Relaxed),
            delivered: self.registry.delivered.load(Ordering::Relaxed),
            handler_failures: self.registry.handler_failures.load(Ordering::Relaxed),
            handlers,
        }
    }

    fn register(
        &self,
        topic: E::Topic,
        handler: Handler<E>,
        once: bool,
    ) -> Result<Subscription, BusError> {
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut state = self.registry.state.lock();
            if state.closed {
                return Err(BusError::Closed);
            }
            state.next_id += 1;
            let id = state.next_id;
            state.handlers.entry(topic).or_default().push(Registration {
                id,
                handler,
                once,
                active: Arc::clone(&active),
            });
            id
        };

        debug!(topic = topic.name(), subscription = id, once, "Handler registered");

        let registry: Weak<dyn Unregister> = Arc::downgrade(&self.registry) as Weak<dyn Unregister>;
        Ok(Subscription::new(id, topic.name(), active, registry))
    }
}

impl<E: Events> Default for LocalMessageBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Events> Clone for LocalMessageBus<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E: Events> MessageBus<E> for LocalMessageBus<E> {
    fn on(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError> {
        self.register(topic, handler, false)
    }

    fn once(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError> {
        self.register(topic, handler, true)
    }

    fn emit(&self, event: E) -> Result<(), BusError> {
        self.emit_with_report(event).map(|_| ())
    }

    fn destroy(&self) {
        let removed = {
            let mut state = self.registry.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.handlers)
        };

        let mut count = 0usize;
        for registration in removed.values().flatten() {
            registration.active.store(false, Ordering::Release);
            count += 1;
        }

        debug!(handlers = count, "Local bus destroyed");
    }

    fn is_closed(&self) -> bool {
        self.registry.state.lock().closed
    }
}
