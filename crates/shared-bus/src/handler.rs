//! # Handlers
//!
//! Callbacks registered on a bus. A handler never owns the bus; the bus owns
//! the registration.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::errors::HandlerError;

/// Boxed error a fallible handler may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type HandlerFn<E> = dyn Fn(&E) -> Result<(), BoxError> + Send + Sync;

/// A shareable callback for one topic.
pub struct Handler<E> {
    callback: Arc<HandlerFn<E>>,
}

impl<E: 'static> Handler<E> {
    /// Wrap an infallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(move |event| {
                callback(event);
                Ok(())
            }),
        }
    }

    /// Wrap a callback that may fail. Failures are isolated by the bus.
    pub fn fallible<F, Err>(callback: F) -> Self
    where
        F: Fn(&E) -> Result<(), Err> + Send + Sync + 'static,
        Err: Into<BoxError>,
    {
        Self {
            callback: Arc::new(move |event| callback(event).map_err(Into::into)),
        }
    }

    /// Run the callback, converting errors and panics into [`HandlerError`].
    pub(crate) fn invoke(
        &self,
        event: &E,
        topic: &'static str,
        subscription: u64,
    ) -> Result<(), HandlerError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(event))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(HandlerError::Failed {
                topic,
                subscription,
                message: err.to_string(),
            }),
            Err(payload) => Err(HandlerError::Panicked {
                topic,
                subscription,
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E> fmt::Debug for Handler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
