//! # Priority-Aware Bus
//!
//! Decorator over any [`MessageBus`] that reorders outgoing traffic by
//! [`PriorityClass`]. Registration passes straight through; only `emit` is
//! intercepted.
//!
//! ## Scheduling
//!
//! - One FIFO per class. Order inside a class is emit order.
//! - Higher classes go first, except that a non-empty class passed over `K`
//!   consecutive selections is served next.
//! - A drain pass forwards until the queues are empty or the
//!   [`DrainBudget`] runs out.
//! - An emit made while a pass is running (for example from a handler the
//!   pass invoked) only enqueues. The running pass picks it up.
//! - In [`DrainMode::Inline`] the emitting caller keeps starting passes until
//!   the queues are empty, so the budget only splits the work into cycles.
//!   Nothing would resume a cut-short pass later.
//! - [`PriorityAwareBus::destroy_after_flush`] lets the queued messages out,
//!   ignoring the budget, before the bus closes.
//!
//! No lock is held while the wrapped bus is called.

mod config;
mod queues;
mod stats;

pub use config::{DrainBudget, DrainMode, SchedulerConfig, DEFAULT_STARVATION_BOUND};
pub use stats::SchedulerStats;

use std::time::Instant;

use parking_lot::Mutex;
use shared_types::{Events, PriorityClass, Topic};
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use crate::bus::MessageBus;
use crate::errors::BusError;
use crate::handler::Handler;
use crate::subscription::Subscription;
use queues::{ClassQueues, Pending, Selection};
use stats::SchedulerCounters;

/// What one drain pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Messages handed to the wrapped bus (accepted or not).
    pub forwarded: usize,
    /// Messages still queued when the pass ended.
    pub remaining: usize,
    /// True when the pass stopped on its budget with work left over.
    pub budget_exhausted: bool,
}

struct SchedulerState<E> {
    queues: ClassQueues<E>,
    draining: bool,
    closing: bool,
    closed: bool,
    next_seq: u64,
}

/// Clears the draining flag if a pass unwinds.
struct DrainGuard<'a, E> {
    state: &'a Mutex<SchedulerState<E>>,
    armed: bool,
}

impl<E> Drop for DrainGuard<'_, E> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().draining = false;
        }
    }
}

/// Priority scheduler in front of a wrapped bus `B`.
pub struct PriorityAwareBus<E: Events, B> {
    inner: B,
    config: SchedulerConfig<E::Topic>,
    state: Mutex<SchedulerState<E>>,
    wake: Notify,
    counters: SchedulerCounters,
}

impl<E, B> PriorityAwareBus<E, B>
where
    E: Events,
    B: MessageBus<E>,
{
    /// Wrap `inner` with the default configuration.
    pub fn new(inner: B) -> Self {
        Self::with_config(inner, SchedulerConfig::default())
    }

    pub fn with_config(inner: B, config: SchedulerConfig<E::Topic>) -> Self {
        debug!(
            starvation_bound = ?config.starvation_bound,
            drain_mode = ?config.drain_mode,
            coalescing = config.coalesce.len(),
            "Priority bus created"
        );
        Self {
            inner,
            config,
            state: Mutex::new(SchedulerState {
                queues: ClassQueues::new(),
                draining: false,
                closing: false,
                closed: false,
                next_seq: 0,
            }),
            wake: Notify::new(),
            counters: SchedulerCounters::default(),
        }
    }

    /// The wrapped bus.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn config(&self) -> &SchedulerConfig<E::Topic> {
        &self.config
    }

    /// Messages waiting in all classes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queues.len()
    }

    /// Messages waiting in one class.
    #[must_use]
    pub fn pending_in(&self, class: PriorityClass) -> usize {
        self.state.lock().queues.len_of(class)
    }

    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let depths = self.state.lock().queues.depths();
        self.counters.snapshot(depths)
    }

    /// Run one drain pass on the calling thread.
    ///
    /// Returns immediately if a pass is already running or the bus is closed.
    pub fn drain(&self) -> DrainOutcome {
        {
            let mut state = self.state.lock();
            if state.draining || state.closed {
                return DrainOutcome::default();
            }
            state.draining = true;
        }

        let mut guard = DrainGuard {
            state: &self.state,
            armed: true,
        };
        let started = Instant::now();
        let mut outcome = DrainOutcome::default();
        let mut seal = false;

        loop {
            let selection = {
                let mut state = self.state.lock();
                let next = if state.closed {
                    None
                } else if !state.closing
                    && self
                        .config
                        .budget
                        .is_exhausted(outcome.forwarded, started.elapsed())
                {
                    outcome.budget_exhausted = !state.queues.is_empty();
                    None
                } else {
                    state.queues.select(self.config.starvation_bound)
                };
                if next.is_none() {
                    state.draining = false;
                    guard.armed = false;
                    outcome.remaining = state.queues.len();
                    if state.closing && !state.closed {
                        state.closed = true;
                        seal = true;
                    }
                }
                next
            };

            let Some(selection) = selection else {
                break;
            };
            self.forward(selection);
            outcome.forwarded += 1;
        }

        if outcome.budget_exhausted {
            debug!(
                forwarded = outcome.forwarded,
                remaining = outcome.remaining,
                "Drain budget exhausted"
            );
        }
        if seal {
            self.seal(0);
        }
        outcome
    }

    /// Close the bus once everything already queued has been forwarded.
    ///
    /// New emits are refused from here on. If a pass is running (on another
    /// thread, or further up this thread's stack) that pass forwards the
    /// rest and closes; otherwise the caller drains. The budget does not
    /// apply to this final flush.
    pub fn destroy_after_flush(&self) {
        let drain_here = {
            let mut state = self.state.lock();
            if state.closed || state.closing {
                return;
            }
            state.closing = true;
            !state.draining
        };

        if drain_here {
            self.drain();
        } else {
            debug!("Final flush left to the running pass");
        }
    }

    fn seal(&self, discarded: usize) {
        self.wake.notify_one();
        self.inner.destroy();
        debug!(discarded, "Priority bus destroyed");
    }

    /// Drive deferred draining until the bus is destroyed.
    ///
    /// Intended for [`DrainMode::Deferred`]; each wake-up runs one pass and a
    /// pass cut short by its budget yields before the next one.
    pub async fn run(&self) {
        debug!("Drain loop started");
        loop {
            if self.is_closed() {
                break;
            }
            let outcome = self.drain();
            if self.is_closed() {
                break;
            }
            if outcome.budget_exhausted {
                tokio::task::yield_now().await;
                continue;
            }
            self.wake.notified().await;
        }
        debug!("Drain loop stopped");
    }

    fn forward(&self, selection: Selection<E>) {
        let Selection {
            pending: Pending { event, seq },
            class,
            promoted,
        } = selection;
        let topic = event.name();

        if promoted {
            SchedulerCounters::bump(&self.counters.promotions);
            debug!(topic, class = %class, seq, "Starved class promoted");
        }

        match self.inner.emit(event) {
            Ok(()) => {
                SchedulerCounters::bump(&self.counters.forwarded);
                trace!(topic, class = %class, seq, "Forwarded");
            }
            Err(err) => {
                SchedulerCounters::bump(&self.counters.forward_failures);
                warn!(topic, class = %class, seq, error = %err, "Wrapped bus rejected message");
            }
        }
    }
}

impl<E, B> MessageBus<E> for PriorityAwareBus<E, B>
where
    E: Events,
    B: MessageBus<E>,
{
    fn on(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError> {
        self.inner.on(topic, handler)
    }

    fn once(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError> {
        self.inner.once(topic, handler)
    }

    fn emit(&self, event: E) -> Result<(), BusError> {
        let topic = event.topic();
        let class = topic.class();

        let drain_now = {
            let mut state = self.state.lock();
            if state.closed || state.closing {
                SchedulerCounters::bump(&self.counters.rejected);
                debug!(topic = topic.name(), "Emit on closed priority bus");
                return Err(BusError::Closed);
            }

            let event = if self.config.coalesces(topic) {
                match state.queues.coalesce(class, event) {
                    Ok(()) => {
                        SchedulerCounters::bump(&self.counters.coalesced);
                        trace!(topic = topic.name(), "Coalesced into queued message");
                        None
                    }
                    Err(event) => Some(event),
                }
            } else {
                Some(event)
            };

            if let Some(event) = event {
                state.next_seq += 1;
                let seq = state.next_seq;
                let capacity = self.config.capacity_of(class);
                if let Some(evicted) = state.queues.push(class, Pending { event, seq }, capacity) {
                    SchedulerCounters::bump(&self.counters.evicted);
                    warn!(
                        topic = evicted.event.name(),
                        class = %class,
                        seq = evicted.seq,
                        "Queue full, dropped oldest message"
                    );
                }
                SchedulerCounters::bump(&self.counters.enqueued);
            }

            self.config.drain_mode == DrainMode::Inline && !state.draining
        };

        match self.config.drain_mode {
            DrainMode::Inline => {
                if drain_now {
                    while self.drain().budget_exhausted {}
                }
            }
            DrainMode::Deferred => self.wake.notify_one(),
        }
        Ok(())
    }

    fn destroy(&self) {
        let discarded = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.queues.clear()
        };
        self.seal(discarded);
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
