//! # Event Streams
//!
//! Async view of one topic. The stream owns its [`Subscription`]: dropping
//! the stream unsubscribes, and destroying the bus ends the stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use shared_types::Events;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::bus::MessageBus;
use crate::errors::BusError;
use crate::handler::Handler;
use crate::subscription::Subscription;

/// Stream of events delivered to one topic.
pub struct EventStream<E> {
    receiver: UnboundedReceiverStream<E>,
    subscription: Subscription,
}

impl<E: Events + Clone> EventStream<E> {
    /// Subscribe to `topic` on `bus`.
    pub fn subscribe<B>(bus: &B, topic: E::Topic) -> Result<Self, BusError>
    where
        B: MessageBus<E> + ?Sized,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = bus.on(
            topic,
            Handler::new(move |event: &E| {
                // Receiver gone means the stream was dropped mid-dispatch.
                let _ = sender.send(event.clone());
            }),
        )?;

        Ok(Self {
            receiver: UnboundedReceiverStream::new(receiver),
            subscription,
        })
    }

    /// Next event, or `None` once the bus is destroyed.
    pub async fn next_event(&mut self) -> Option<E> {
        self.receiver.next().await
    }

    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl<E> Stream for EventStream<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}
