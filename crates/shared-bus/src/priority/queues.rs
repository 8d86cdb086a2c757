//! Per-class FIFOs and the selection rule.
//!
//! Selection is strict priority with one exception: a non-empty class that
//! has been passed over `K` consecutive times is served next. When several
//! classes are starved at once, the one passed over longest wins, ties going
//! to the higher class.

use std::collections::VecDeque;

use shared_types::{Events, PriorityClass};

/// A queued message and its enqueue sequence number.
#[derive(Debug)]
pub(crate) struct Pending<E> {
    pub(crate) event: E,
    pub(crate) seq: u64,
}

/// Result of one selection.
#[derive(Debug)]
pub(crate) struct Selection<E> {
    pub(crate) pending: Pending<E>,
    pub(crate) class: PriorityClass,
    /// True when the starvation guard overrode strict priority.
    pub(crate) promoted: bool,
}

#[derive(Debug)]
pub(crate) struct ClassQueues<E> {
    queues: [VecDeque<Pending<E>>; PriorityClass::COUNT],
    skipped: [u32; PriorityClass::COUNT],
}

impl<E: Events> ClassQueues<E> {
    pub(crate) fn new() -> Self {
        Self {
            queues: std::array::from_fn(|_| VecDeque::new()),
            skipped: [0; PriorityClass::COUNT],
        }
    }

    /// Append to the tail of `class`. When the queue is at `capacity` the
    /// head is evicted first and returned.
    pub(crate) fn push(
        &mut self,
        class: PriorityClass,
        pending: Pending<E>,
        capacity: Option<usize>,
    ) -> Option<Pending<E>> {
        let queue = &mut self.queues[class.index()];
        let evicted = match capacity {
            Some(capacity) if queue.len() >= capacity.max(1) => queue.pop_front(),
            _ => None,
        };
        queue.push_back(pending);
        evicted
    }

    /// Replace the payload of the newest queued message with the same topic,
    /// keeping its position. Hands the event back when nothing matched.
    pub(crate) fn coalesce(&mut self, class: PriorityClass, event: E) -> Result<(), E> {
        let topic = event.topic();
        match self.queues[class.index()]
            .iter_mut()
            .rev()
            .find(|pending| pending.event.topic() == topic)
        {
            Some(slot) => {
                slot.event = event;
                Ok(())
            }
            None => Err(event),
        }
    }

    /// Pick and remove the next message.
    pub(crate) fn select(&mut self, starvation_bound: Option<u32>) -> Option<Selection<E>> {
        let highest = (0..PriorityClass::COUNT).find(|&i| !self.queues[i].is_empty())?;

        let starved = starvation_bound.and_then(|bound| {
            (0..PriorityClass::COUNT)
                .filter(|&i| !self.queues[i].is_empty() && self.skipped[i] >= bound)
                .max_by(|&a, &b| self.skipped[a].cmp(&self.skipped[b]).then(b.cmp(&a)))
        });
        let chosen = starved.unwrap_or(highest);

        for index in 0..PriorityClass::COUNT {
            if index == chosen || self.queues[index].is_empty() {
                self.skipped[index] = 0;
            } else {
                self.skipped[index] = self.skipped[index].saturating_add(1);
            }
        }

        let class = PriorityClass::from_index(chosen)?;
        let pending = self.queues[chosen].pop_front()?;
        Some(Selection {
            pending,
            class,
            promoted: chosen != highest,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub(crate) fn len_of(&self, class: PriorityClass) -> usize {
        self.queues[class.index()].len()
    }

    pub(crate) fn depths(&self) -> [usize; PriorityClass::COUNT] {
        std::array::from_fn(|i| self.queues[i].len())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Discard everything. Returns the number of messages dropped.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.len();
        for queue in &mut self.queues {
            queue.clear();
        }
        self.skipped = [0; PriorityClass::COUNT];
        dropped
    }
}
