//! # Subscriptions
//!
//! Handle returned by `on`/`once`. Its only capability is unregistering the
//! handler it was created for.
//!
//! The handle holds a weak reference to the registry, so unsubscribing after
//! the bus is destroyed or dropped is a harmless no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Implemented by registries that can drop a registration by id.
pub(crate) trait Unregister: Send + Sync {
    fn unregister(&self, id: u64);
}

/// A live handler registration.
///
/// Dropping the handle unsubscribes. Call [`Subscription::detach`] to keep
/// the handler registered for the lifetime of the bus.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: u64,
    topic: &'static str,
    active: Arc<AtomicBool>,
    registry: Weak<dyn Unregister>,
    detached: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        topic: &'static str,
        active: Arc<AtomicBool>,
        registry: Weak<dyn Unregister>,
    ) -> Self {
        Self {
            id,
            topic,
            active,
            registry,
            detached: false,
        }
    }

    /// Registration id, unique per bus.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Topic the handler is registered on.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        self.topic
    }

    /// True until the handler is unsubscribed, fired (for `once`) or the
    /// bus is destroyed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Unregister the handler. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
        debug!(topic = self.topic, subscription = self.id, "Unsubscribed");
    }

    /// Keep the handler registered after this handle is dropped.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}
