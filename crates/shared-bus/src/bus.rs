//! # Message Bus Contract
//!
//! The capability set shared by every bus in the workspace: the local
//! in-process bus, the priority-aware decorator and the port adapter. Any
//! implementation can be wrapped by, or substituted for, another.

use serde_json::Value;
use shared_types::{Events, Topic};
use std::sync::Arc;

use crate::errors::BusError;
use crate::handler::Handler;
use crate::subscription::Subscription;

/// Typed publish/subscribe over a closed catalog `E`.
///
/// ## Closed-bus policy
///
/// After [`MessageBus::destroy`], `on`, `once` and `emit` return
/// [`BusError::Closed`]. `destroy` itself is idempotent. Nothing panics.
pub trait MessageBus<E: Events>: Send + Sync {
    /// Register `handler` for `topic`. Handlers run in registration order.
    fn on(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError>;

    /// As [`MessageBus::on`], but the handler is removed before its first
    /// delivery.
    fn once(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError>;

    /// Publish an event.
    fn emit(&self, event: E) -> Result<(), BusError>;

    /// Drop all registrations and refuse further traffic.
    fn destroy(&self);

    /// True once [`MessageBus::destroy`] has run.
    fn is_closed(&self) -> bool;

    /// Register by wire name. Unknown names fail with [`BusError::InvalidTopic`].
    fn on_named(&self, topic: &str, handler: Handler<E>) -> Result<Subscription, BusError> {
        let topic =
            E::Topic::parse(topic).ok_or_else(|| BusError::InvalidTopic(topic.to_string()))?;
        self.on(topic, handler)
    }

    /// Publish by wire name and positional arguments.
    ///
    /// The pair is decoded against the catalog before anything else happens,
    /// so a rejected call has no side effect.
    fn emit_named(&self, topic: &str, args: Vec<Value>) -> Result<(), BusError> {
        let event = E::decode(topic, args)?;
        self.emit(event)
    }

    /// Register an infallible closure.
    fn subscribe<F>(&self, topic: E::Topic, callback: F) -> Result<Subscription, BusError>
    where
        F: Fn(&E) + Send + Sync + 'static,
        Self: Sized,
    {
        self.on(topic, Handler::new(callback))
    }
}

impl<E, B> MessageBus<E> for Arc<B>
where
    E: Events,
    B: MessageBus<E> + ?Sized,
{
    fn on(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError> {
        (**self).on(topic, handler)
    }

    fn once(&self, topic: E::Topic, handler: Handler<E>) -> Result<Subscription, BusError> {
        (**self).once(topic, handler)
    }

    fn emit(&self, event: E) -> Result<(), BusError> {
        (**self).emit(event)
    }

    fn destroy(&self) {
        (**self).destroy();
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
