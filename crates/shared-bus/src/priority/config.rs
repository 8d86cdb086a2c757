//! Scheduler configuration.

use std::collections::HashSet;
use std::time::Duration;

use shared_types::{PriorityClass, Topic};

/// Default starvation bound `K`: a queued class is passed over at most this
/// many consecutive selections before it is served.
pub const DEFAULT_STARVATION_BOUND: u32 = 3;

/// Upper limit on the work a single drain pass may do.
///
/// A pass stops when either limit is reached; leftover messages stay queued
/// for the next pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainBudget {
    /// Maximum messages forwarded per pass.
    pub max_messages: Option<usize>,
    /// Maximum wall-clock time spent per pass.
    pub max_duration: Option<Duration>,
}

impl DrainBudget {
    /// No limit. Every pass empties the queues.
    pub const UNBOUNDED: Self = Self {
        max_messages: None,
        max_duration: None,
    };

    /// Stop after `count` messages. A zero count is raised to one.
    #[must_use]
    pub fn messages(count: usize) -> Self {
        Self {
            max_messages: Some(count.max(1)),
            max_duration: None,
        }
    }

    /// Stop after `limit` has elapsed.
    #[must_use]
    pub fn duration(limit: Duration) -> Self {
        Self {
            max_messages: None,
            max_duration: Some(limit),
        }
    }

    pub(crate) fn is_exhausted(&self, forwarded: usize, elapsed: Duration) -> bool {
        self.max_messages.is_some_and(|max| forwarded >= max)
            || self.max_duration.is_some_and(|max| elapsed >= max)
    }
}

/// When queued messages are forwarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrainMode {
    /// The emitting call drains before it returns (unless a drain is
    /// already running further up the stack).
    #[default]
    Inline,
    /// `emit` only enqueues and wakes [`PriorityAwareBus::run`](super::PriorityAwareBus::run).
    Deferred,
}

/// Tuning for a [`PriorityAwareBus`](super::PriorityAwareBus).
#[derive(Debug, Clone)]
pub struct SchedulerConfig<T: Topic> {
    /// Starvation bound `K`. `None` gives pure strict priority.
    pub starvation_bound: Option<u32>,
    /// Per-pass drain limit.
    pub budget: DrainBudget,
    /// Per-class queue capacity, indexed by [`PriorityClass::index`].
    /// A full queue evicts its oldest entry.
    pub queue_capacity: [Option<usize>; PriorityClass::COUNT],
    /// When forwarding happens.
    pub drain_mode: DrainMode,
    /// Topics whose queued message is replaced by a newer one instead of
    /// queueing a second copy.
    pub coalesce: HashSet<T>,
}

impl<T: Topic> Default for SchedulerConfig<T> {
    fn default() -> Self {
        Self {
            starvation_bound: Some(DEFAULT_STARVATION_BOUND),
            budget: DrainBudget::UNBOUNDED,
            queue_capacity: [None; PriorityClass::COUNT],
            drain_mode: DrainMode::Inline,
            coalesce: HashSet::new(),
        }
    }
}

impl<T: Topic> SchedulerConfig<T> {
    /// Set `K`. `None` disables the guard; zero is raised to one.
    #[must_use]
    pub fn with_starvation_bound(mut self, bound: Option<u32>) -> Self {
        self.starvation_bound = bound.map(|k| k.max(1));
        self
    }

    #[must_use]
    pub fn with_budget(mut self, budget: DrainBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Cap one class. A zero capacity is raised to one.
    #[must_use]
    pub fn with_queue_capacity(mut self, class: PriorityClass, capacity: usize) -> Self {
        self.queue_capacity[class.index()] = Some(capacity.max(1));
        self
    }

    /// Cap every class.
    #[must_use]
    pub fn with_queue_capacity_all(mut self, capacity: usize) -> Self {
        self.queue_capacity = [Some(capacity.max(1)); PriorityClass::COUNT];
        self
    }

    #[must_use]
    pub fn with_drain_mode(mut self, mode: DrainMode) -> Self {
        self.drain_mode = mode;
        self
    }

    /// Mark topics as coalescing.
    #[must_use]
    pub fn coalescing(mut self, topics: impl IntoIterator<Item = T>) -> Self {
        self.coalesce.extend(topics);
        self
    }

    pub(crate) fn capacity_of(&self, class: PriorityClass) -> Option<usize> {
        self.queue_capacity[class.index()]
    }

    pub(crate) fn coalesces(&self, topic: T) -> bool {
        self.coalesce.contains(&topic)
    }
}
