//! Scheduler counters.

use std::sync::atomic::{AtomicU64, Ordering};

use shared_types::PriorityClass;

/// Point-in-time view of a [`PriorityAwareBus`](super::PriorityAwareBus).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Messages accepted into a queue.
    pub enqueued: u64,
    /// Messages the wrapped bus accepted.
    pub forwarded: u64,
    /// Messages dropped because their class queue was full.
    pub evicted: u64,
    /// Messages merged into an already queued message of the same topic.
    pub coalesced: u64,
    /// Messages the wrapped bus rejected.
    pub forward_failures: u64,
    /// Selections where the starvation guard overrode strict priority.
    pub promotions: u64,
    /// Emits refused because the bus was closed.
    pub rejected: u64,
    /// Current depth per class, indexed by [`PriorityClass::index`].
    pub queued: [usize; PriorityClass::COUNT],
}

impl SchedulerStats {
    #[must_use]
    pub fn queued_in(&self, class: PriorityClass) -> usize {
        self.queued[class.index()]
    }

    #[must_use]
    pub fn total_queued(&self) -> usize {
        self.queued.iter().sum()
    }
}

#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub(crate) enqueued: AtomicU64,
    pub(crate) forwarded: AtomicU64,
    pub(crate) evicted: AtomicU64,
    pub(crate) coalesced: AtomicU64,
    pub(crate) forward_failures: AtomicU64,
    pub(crate) promotions: AtomicU64,
    pub(crate) rejected: AtomicU64,
}

impl SchedulerCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, queued: [usize; PriorityClass::COUNT]) -> SchedulerStats {
        SchedulerStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            forward_failures: self.forward_failures.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            queued,
        }
    }
}
