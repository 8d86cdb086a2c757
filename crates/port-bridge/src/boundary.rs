//! # Batch Boundaries
//!
//! A batch boundary wraps a unit of work so that observers are notified once
//! when it completes, however many local handlers ran inside it.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// Scope inside which one inbound batch is dispatched.
pub trait BatchBoundary: Send + Sync {
    fn run_batched(&self, work: &mut dyn FnMut());
}

/// Runs the work with no notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl BatchBoundary for Immediate {
    fn run_batched(&self, work: &mut dyn FnMut()) {
        work();
    }
}

/// Bumps a revision counter after every batch.
///
/// Observers hold a [`watch::Receiver`] and re-read their state once per
/// `changed()`, however many messages the batch carried.
#[derive(Debug)]
pub struct ChangeNotifier {
    revision: watch::Sender<u64>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self { revision }
    }

    /// Receiver that wakes once per completed batch.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of batches completed so far.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchBoundary for ChangeNotifier {
    fn run_batched(&self, work: &mut dyn FnMut()) {
        work();
        self.revision.send_modify(|revision| *revision += 1);
    }
}

/// Counts invocations.
#[derive(Debug, Default)]
pub struct CountingBoundary {
    calls: AtomicUsize,
}

impl CountingBoundary {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }
}

impl BatchBoundary for CountingBoundary {
    fn run_batched(&self, work: &mut dyn FnMut()) {
        self.calls.fetch_add(1, Ordering::AcqRel);
        work();
    }
}
